use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::common::ApiResponse;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// A required credential or secret is missing; raised before any network I/O.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure while talking to an upstream service.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The upstream answered, but with an error status. Relayed verbatim.
    #[error("Upstream returned {status}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("Login failed: {0}")]
    Auth(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Upstream(e.to_string())
    }
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Upstream(_) | GatewayError::Auth(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamStatus { status, .. } => *status,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            GatewayError::UpstreamStatus { body, .. } => (status, body).into_response(),
            other => (status, ApiResponse::err(other.to_string())).into_response(),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
