//! 网关配置
//! 所有字段既可通过命令行参数传入，也可通过环境变量传入

use clap::Args;
use std::fmt;
use std::time::Duration;

use crate::error::{GatewayError, GatewayResult};

#[derive(Args, Clone)]
pub struct GatewayConfig {
    /// Base URL of the upstream tabular-database API
    #[arg(
        long,
        env = "BASEROW_BASE_URL",
        default_value = "https://api.baserow.io/api"
    )]
    pub base_url: String,

    /// Comma-separated static credentials, one per workspace
    #[arg(long, env = "BASEROW_AUTH_TOKENS")]
    pub auth_tokens: Option<String>,

    /// Single static credential, used when the list is unset
    #[arg(long, env = "BASEROW_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Development-only credential used when no other credential is configured
    #[arg(long, env = "BASEROW_FALLBACK_TOKEN")]
    pub fallback_token: Option<String>,

    #[arg(long, env = "BASEROW_JWT_EMAIL")]
    pub jwt_email: Option<String>,

    #[arg(long, env = "BASEROW_JWT_PASSWORD")]
    pub jwt_password: Option<String>,

    #[arg(long, env = "AUTH_COOKIE_NAME", default_value = "jwt")]
    pub cookie_name: String,

    #[arg(long, env = "LOGIN_URL", default_value = "http://127.0.0.1:1000/login")]
    pub login_url: String,

    #[arg(
        long,
        env = "USER_VALIDATE_URL",
        default_value = "http://127.0.0.1:1000/api/ext/validate"
    )]
    pub validate_url: String,

    /// Bearer credential sent to the session validation endpoint
    #[arg(long, env = "USER_VALIDATE_AUTH")]
    pub validate_auth: Option<String>,

    /// Comma-separated list of origins allowed to call the gateway with cookies
    #[arg(long, env = "FRONTEND_ORIGINS", default_value = "http://127.0.0.1:5173")]
    pub frontend_origins: String,

    /// Per-call deadline for upstream requests, in seconds (unset = no deadline)
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,
}

impl GatewayConfig {
    /// 配置中的凭据原始串：优先使用列表，其次单个凭据
    pub fn raw_credentials(&self) -> Option<&str> {
        non_blank(self.auth_tokens.as_deref()).or_else(|| non_blank(self.auth_token.as_deref()))
    }

    pub fn jwt_credentials(&self) -> Option<(&str, &str)> {
        match (
            non_blank(self.jwt_email.as_deref()),
            non_blank(self.jwt_password.as_deref()),
        ) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        }
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.map(Duration::from_secs)
    }

    /// 解析 CORS 允许的来源；携带 Cookie 时不允许通配符
    pub fn allowed_origins(&self) -> GatewayResult<Vec<String>> {
        let origins: Vec<String> = self
            .frontend_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.iter().any(|o| o == "*") {
            return Err(GatewayError::Config(
                "FRONTEND_ORIGINS must list explicit origins when cookies are allowed".into(),
            ));
        }
        Ok(origins)
    }

    pub fn validate_base_url(&self) -> GatewayResult<()> {
        url::Url::parse(&self.base_url)
            .map(|_| ())
            .map_err(|e| GatewayError::Config(format!("invalid BASEROW_BASE_URL: {}", e)))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "<redacted>"
    } else {
        "<unset>"
    }
}

// 秘密字段永不进入日志
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("auth_tokens", &redact(&self.auth_tokens))
            .field("auth_token", &redact(&self.auth_token))
            .field("fallback_token", &redact(&self.fallback_token))
            .field("jwt_email", &redact(&self.jwt_email))
            .field("jwt_password", &redact(&self.jwt_password))
            .field("cookie_name", &self.cookie_name)
            .field("login_url", &self.login_url)
            .field("validate_url", &self.validate_url)
            .field("validate_auth", &redact(&self.validate_auth))
            .field("frontend_origins", &self.frontend_origins)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .finish()
    }
}
