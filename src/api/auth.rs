//! 会话相关端点：状态、当前用户、登出

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::core::models::SessionStatus;
use crate::error::GatewayResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub login_url: String,
    pub cookie_name: String,
}

fn session_cookie(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 仅检查 Cookie 是否存在，不做校验
pub async fn auth_status(State(state): State<Arc<AppState>>, jar: CookieJar) -> Json<AuthStatus> {
    let name = &state.config.cookie_name;
    Json(AuthStatus {
        authenticated: session_cookie(&jar, name).is_some(),
        login_url: state.config.login_url.clone(),
        cookie_name: name.clone(),
    })
}

pub async fn auth_me(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> GatewayResult<Json<SessionStatus>> {
    let cookie = session_cookie(&jar, &state.config.cookie_name);
    let status = state.session_validator.validate(cookie.as_deref()).await?;
    Ok(Json(status))
}

pub async fn auth_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    let mut cookie = Cookie::new(state.config.cookie_name.clone(), "");
    cookie.set_path("/");
    cookie.make_removal();
    (jar.add(cookie), Json(json!({ "ok": true })))
}
