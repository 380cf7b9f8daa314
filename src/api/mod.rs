use crate::core::models::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::proxy::handlers;
use crate::state::AppState;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

mod auth;
pub mod common;
mod jwt;

pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Proxy
        .route(
            "/token/",
            get(handlers::handle_token_proxy)
                .post(handlers::handle_token_proxy)
                .put(handlers::handle_token_proxy)
                .patch(handlers::handle_token_proxy)
                .delete(handlers::handle_token_proxy),
        )
        .route(
            "/token/*path",
            get(handlers::handle_token_proxy)
                .post(handlers::handle_token_proxy)
                .put(handlers::handle_token_proxy)
                .patch(handlers::handle_token_proxy)
                .delete(handlers::handle_token_proxy),
        )
        // Token exchange
        .route("/jwt/applications/:id", get(jwt::get_application))
        // Session
        .route("/auth/status", get(auth::auth_status))
        .route("/auth/me", get(auth::auth_me))
        .route("/auth/logout", post(auth::auth_logout))
        // Health
        .route("/health", get(common::health_check))
        .route("/healthz", get(common::health_check))
        .with_state(state)
}

/// 携带 Cookie 的跨域请求只允许显式列出的来源
pub fn cors_layer(config: &GatewayConfig) -> GatewayResult<CorsLayer> {
    let origins = config
        .allowed_origins()?
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|_| GatewayError::Config(format!("invalid origin: {}", o)))
        })
        .collect::<GatewayResult<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}
