//! 静态凭据池
//! 每个凭据对应一个上游 workspace，身份即其在列表中的下标

use axum::http::HeaderValue;

use crate::error::{GatewayError, GatewayResult};

/// 客户端指定凭据下标的请求头
pub const TOKEN_INDEX_HEADER: &str = "x-baserow-token-index";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Token,
    Jwt,
}

impl Scheme {
    fn prefix(self) -> &'static str {
        match self {
            Scheme::Token => "Token",
            Scheme::Jwt => "JWT",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    scheme: Scheme,
    secret: String,
}

impl Credential {
    /// 归一化：未带 `Token ` / `JWT ` 前缀(不区分大小写)的密钥按 Token 处理
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        for scheme in [Scheme::Token, Scheme::Jwt] {
            let prefix = scheme.prefix();
            if raw.len() > prefix.len()
                && raw.as_bytes()[prefix.len()] == b' '
                && raw[..prefix.len()].eq_ignore_ascii_case(prefix)
            {
                return Self {
                    scheme,
                    secret: raw[prefix.len() + 1..].to_string(),
                };
            }
        }
        Self {
            scheme: Scheme::Token,
            secret: raw.to_string(),
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// `Authorization` 头的值，如 `Token abc`
    pub fn header_value(&self) -> String {
        format!("{} {}", self.scheme.prefix(), self.secret)
    }

    pub fn to_header(&self) -> GatewayResult<HeaderValue> {
        let mut value = HeaderValue::from_str(&self.header_value())
            .map_err(|_| GatewayError::Config("credential contains invalid header bytes".into()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("scheme", &self.scheme)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// 进程级、只读的凭据列表，保证非空
#[derive(Debug, Clone)]
pub struct CredentialStore {
    credentials: Vec<Credential>,
}

impl CredentialStore {
    /// 从逗号分隔的配置串构建；空项被丢弃。
    /// 列表为空时使用 `fallback`（仅用于开发环境），两者皆无则报错。
    pub fn from_config(raw: Option<&str>, fallback: Option<&str>) -> GatewayResult<Self> {
        let mut credentials: Vec<Credential> = raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Credential::parse)
            .collect();

        if credentials.is_empty() {
            if let Some(fallback) = fallback.map(str::trim).filter(|t| !t.is_empty()) {
                tracing::warn!("No upstream credentials configured, using the fallback credential");
                credentials.push(Credential::parse(fallback));
            }
        }

        if credentials.is_empty() {
            return Err(GatewayError::Config(
                "BASEROW_AUTH_TOKENS / BASEROW_AUTH_TOKEN is not configured".into(),
            ));
        }
        Ok(Self { credentials })
    }

    /// 选择凭据：缺省或越界时回退到第 0 个，永不失败
    pub fn select(&self, index: Option<i64>) -> &Credential {
        index
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| self.credentials.get(i))
            .unwrap_or(&self.credentials[0])
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Credential)> {
        self.credentials.iter().enumerate()
    }
}

/// 解析请求头中的凭据下标；空白或非整数视为未指定
pub fn requested_index(headers: &axum::http::HeaderMap) -> Option<i64> {
    headers
        .get(TOKEN_INDEX_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<i64>().ok())
}
