//! 会话校验结果模型

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 外部校验接口的原始响应
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValidationResponse {
    pub valid: Option<bool>,
    pub id: Option<Value>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub exp: Option<Value>,
    pub allowed: Option<bool>,
    pub role: Option<String>,
}

/// 归一化后的会话状态；缺失字段序列化为 null
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub id: Option<Value>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub exp: Option<Value>,
    pub allowed: Option<bool>,
    pub role: Option<String>,
}

impl SessionStatus {
    pub fn unauthenticated() -> Self {
        Self::default()
    }
}

impl From<ValidationResponse> for SessionStatus {
    fn from(resp: ValidationResponse) -> Self {
        Self {
            authenticated: resp.valid.unwrap_or(false),
            id: resp.id,
            username: resp.username,
            email: resp.email,
            exp: resp.exp,
            allowed: resp.allowed,
            role: resp.role,
        }
    }
}
