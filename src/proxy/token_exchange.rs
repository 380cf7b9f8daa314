//! 用户名/密码换取 JWT，并用缓存的 JWT 读取单个上游资源

use axum::http::{header, HeaderMap, HeaderValue, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::session_cache::CredentialCache;
use super::upstream::UpstreamClient;
use crate::error::{GatewayError, GatewayResult};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginResponse {
    token: Option<String>,
    access: Option<String>,
    jwt: Option<String>,
}

impl LoginResponse {
    fn into_token(self) -> Option<String> {
        self.token
            .or(self.access)
            .or(self.jwt)
            .filter(|t| !t.is_empty())
    }
}

pub struct TokenExchange {
    upstream: Arc<UpstreamClient>,
    login: Option<(String, String)>,
    cache: CredentialCache,
}

impl TokenExchange {
    pub fn new(
        upstream: Arc<UpstreamClient>,
        login: Option<(String, String)>,
        cache: CredentialCache,
    ) -> Self {
        Self {
            upstream,
            login,
            cache,
        }
    }

    /// 返回有效的会话 token，必要时重新登录
    pub async fn token(&self) -> GatewayResult<String> {
        self.cache.get(|| self.login()).await
    }

    async fn login(&self) -> GatewayResult<String> {
        let (email, password) = self.login.as_ref().ok_or_else(|| {
            GatewayError::Config("BASEROW_JWT_EMAIL/PASSWORD is not configured".into())
        })?;

        let url = self.upstream.build_url("user/token-auth/", None);
        let payload = json!({
            "email": email,
            "username": email,
            "password": password,
        });
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let response = self
            .upstream
            .send(Method::POST, &url, headers, Some(payload.to_string().into()))
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("JWT login rejected with status {}", status.as_u16());
            return Err(GatewayError::Auth(body));
        }

        let parsed: LoginResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Auth(format!("invalid login response: {}", e)))?;

        tracing::info!("JWT session token refreshed");
        parsed
            .into_token()
            .ok_or_else(|| GatewayError::Auth("login response contains no token".into()))
    }

    /// 以 `JWT <token>` 身份读取单个 application
    pub async fn fetch_application(&self, app_id: i64) -> GatewayResult<Value> {
        let token = self.token().await?;
        let url = self
            .upstream
            .build_url(&format!("applications/{}/", app_id), None);

        let mut authorization = HeaderValue::from_str(&format!("JWT {}", token))
            .map_err(|_| GatewayError::Auth("session token is not a valid header value".into()))?;
        authorization.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, authorization);

        let response = self.upstream.send(Method::GET, &url, headers, None).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamStatus { status, body });
        }

        Ok(response.json().await?)
    }
}
