//! 核心模块
//! 配置模型与运行时抽象，不依赖 HTTP 层

pub mod models;
pub mod traits;

pub use traits::{Clock, SystemClock};
