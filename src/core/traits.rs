//! 核心 trait 定义
//! 用于把时间源从业务逻辑中解耦，便于测试

use chrono::{DateTime, Utc};

/// 时间源 trait
/// 生产环境使用系统时钟，测试中可替换为手动推进的时钟
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
