//! 换取到的会话凭据缓存
//! 两种状态：Empty / Valid(token, obtained_at)；只在取用时判断过期

use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::Clock;
use crate::error::GatewayResult;

/// 缓存有效期（秒）
pub const SESSION_TOKEN_TTL_SECS: i64 = 300;

#[derive(Debug, Clone)]
enum CacheState {
    Empty,
    Valid {
        token: String,
        obtained_at: DateTime<Utc>,
    },
}

pub struct CredentialCache {
    state: RwLock<CacheState>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CredentialCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, Duration::seconds(SESSION_TOKEN_TTL_SECS))
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            state: RwLock::new(CacheState::Empty),
            ttl,
            clock,
        }
    }

    /// 未过期时返回缓存的 token
    pub async fn cached(&self) -> Option<String> {
        match &*self.state.read().await {
            CacheState::Valid { token, obtained_at } if self.clock.now() - *obtained_at < self.ttl => {
                Some(token.clone())
            }
            _ => None,
        }
    }

    /// 无条件调用 `login` 并用结果覆盖缓存。
    /// 登录期间不持有锁，并发刷新可能各自登录一次，后写入者生效。
    pub async fn refresh<F, Fut>(&self, login: F) -> GatewayResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = GatewayResult<String>>,
    {
        let obtained_at = self.clock.now();
        let token = login().await?;
        *self.state.write().await = CacheState::Valid {
            token: token.clone(),
            obtained_at,
        };
        Ok(token)
    }

    pub async fn get<F, Fut>(&self, login: F) -> GatewayResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = GatewayResult<String>>,
    {
        if let Some(token) = self.cached().await {
            return Ok(token);
        }
        tracing::debug!("Session token missing or expired, exchanging credentials");
        self.refresh(login).await
    }
}
