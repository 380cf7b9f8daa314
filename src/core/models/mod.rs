pub mod config;
pub mod session;

pub use config::GatewayConfig;
pub use session::SessionStatus;
