//! 会话 Cookie 校验
//! 把 Cookie 值提交给外部校验接口，并归一化返回结果

use axum::http::{header, HeaderMap, HeaderValue, Method};
use serde_json::json;
use std::sync::Arc;

use super::upstream::UpstreamClient;
use crate::core::models::session::{SessionStatus, ValidationResponse};
use crate::error::{GatewayError, GatewayResult};

pub struct SessionValidator {
    upstream: Arc<UpstreamClient>,
    validate_url: String,
    service_auth: Option<String>,
}

impl SessionValidator {
    pub fn new(upstream: Arc<UpstreamClient>, validate_url: &str, service_auth: Option<String>) -> Self {
        Self {
            upstream,
            validate_url: validate_url.to_string(),
            service_auth,
        }
    }

    pub async fn validate(&self, cookie: Option<&str>) -> GatewayResult<SessionStatus> {
        let Some(cookie) = cookie.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(SessionStatus::unauthenticated());
        };

        let service_auth = self
            .service_auth
            .as_deref()
            .ok_or_else(|| GatewayError::Config("USER_VALIDATE_AUTH is not configured".into()))?;
        let mut authorization = HeaderValue::from_str(service_auth)
            .map_err(|_| GatewayError::Config("USER_VALIDATE_AUTH is not a valid header value".into()))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, authorization);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let payload = json!({ "token": cookie });

        let response = self
            .upstream
            .send(
                Method::POST,
                &self.validate_url,
                headers,
                Some(payload.to_string().into()),
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Session validation rejected with status {}", status.as_u16());
            return Err(GatewayError::UpstreamStatus { status, body });
        }

        let parsed: ValidationResponse = response.json().await?;
        Ok(parsed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::test_support::spawn_upstream;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;

    fn validator(base: &str, auth: Option<&str>) -> SessionValidator {
        SessionValidator::new(
            Arc::new(UpstreamClient::new(base, None).unwrap()),
            &format!("{}/api/ext/validate", base),
            auth.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_missing_cookie_skips_network() {
        let v = validator("http://127.0.0.1:1", Some("Bearer svc"));
        assert_eq!(v.validate(None).await.unwrap(), SessionStatus::unauthenticated());
        assert_eq!(v.validate(Some("  ")).await.unwrap(), SessionStatus::unauthenticated());
    }

    #[tokio::test]
    async fn test_valid_cookie_is_normalized() {
        let router = Router::new().route(
            "/api/ext/validate",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer svc");
                assert_eq!(body["token"], "abc");
                Json(json!({"valid": true, "id": "1", "role": "EMPLOYEE"}))
            }),
        );
        let base = spawn_upstream(router).await;

        let status = validator(&base, Some("Bearer svc"))
            .validate(Some("abc"))
            .await
            .unwrap();
        assert!(status.authenticated);
        assert_eq!(status.id, Some(json!("1")));
        assert_eq!(status.role.as_deref(), Some("EMPLOYEE"));
        assert_eq!(status.email, None);
        assert_eq!(status.exp, None);
    }

    #[tokio::test]
    async fn test_validator_error_status_is_relayed() {
        let router = Router::new().route(
            "/api/ext/validate",
            post(|| async { (StatusCode::UNAUTHORIZED, "invalid service token") }),
        );
        let base = spawn_upstream(router).await;

        match validator(&base, Some("Bearer svc")).validate(Some("abc")).await {
            Err(GatewayError::UpstreamStatus { status, body }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(body, "invalid service token");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
