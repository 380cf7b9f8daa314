// proxy 模块 - 上游转发与多凭据聚合

pub mod aggregator;
pub mod credentials;
pub mod handlers; // 转发端点处理器
pub mod headers;
pub mod session_cache;
pub mod session_validator;
pub mod token_exchange;
pub mod upstream; // 上游客户端

#[cfg(test)]
pub(crate) mod test_support;

pub use credentials::{Credential, CredentialStore};
pub use session_cache::CredentialCache;
pub use session_validator::SessionValidator;
pub use token_exchange::TokenExchange;
pub use upstream::UpstreamClient;
