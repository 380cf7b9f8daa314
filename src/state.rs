use std::sync::Arc;

use crate::core::models::GatewayConfig;
use crate::core::{Clock, SystemClock};
use crate::error::GatewayResult;
use crate::proxy::{
    CredentialCache, CredentialStore, SessionValidator, TokenExchange, UpstreamClient,
};

/// Web 应用状态：进程级、启动后只读（会话 token 缓存除外）
pub struct AppState {
    pub config: GatewayConfig,
    pub credentials: CredentialStore,
    pub upstream: Arc<UpstreamClient>,
    pub token_exchange: TokenExchange,
    pub session_validator: SessionValidator,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: GatewayConfig, clock: Arc<dyn Clock>) -> GatewayResult<Self> {
        config.validate_base_url()?;

        let credentials = CredentialStore::from_config(
            config.raw_credentials(),
            config.fallback_token.as_deref(),
        )?;
        let upstream = Arc::new(UpstreamClient::new(
            &config.base_url,
            config.upstream_timeout(),
        )?);

        let login = config
            .jwt_credentials()
            .map(|(email, password)| (email.to_string(), password.to_string()));
        let token_exchange =
            TokenExchange::new(upstream.clone(), login, CredentialCache::new(clock));

        let session_validator = SessionValidator::new(
            upstream.clone(),
            &config.validate_url,
            config
                .validate_auth
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        );

        tracing::info!(
            "Gateway state ready: {} upstream credential(s), base {}",
            credentials.len(),
            config.base_url
        );

        Ok(Self {
            config,
            credentials,
            upstream,
            token_exchange,
            session_validator,
        })
    }
}
