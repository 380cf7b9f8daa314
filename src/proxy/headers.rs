//! 请求/响应头过滤
//! 入站只放行白名单头并强制注入凭据；出站剔除 hop-by-hop 头

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use super::credentials::TOKEN_INDEX_HEADER;

const DROPPED_REQUEST_HEADERS: &[&str] = &[
    "authorization",
    "host",
    "content-length",
    "connection",
    "accept-encoding",
    "origin",
    "referer",
    TOKEN_INDEX_HEADER,
];

const FORWARDED_REQUEST_HEADERS: &[&str] = &["content-type", "accept"];

const HOP_BY_HOP_HEADERS: &[&str] = &[
    "content-encoding",
    "transfer-encoding",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "upgrade",
];

/// 入站头中可安全转发的子集（不含 Authorization）
pub fn forwardable_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in inbound.iter() {
        let name_str = name.as_str();
        if DROPPED_REQUEST_HEADERS.contains(&name_str) {
            continue;
        }
        if FORWARDED_REQUEST_HEADERS.contains(&name_str) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// 在过滤后的头上强制写入凭据，客户端自带的 Authorization 一律忽略
pub fn with_authorization(mut headers: HeaderMap, authorization: HeaderValue) -> HeaderMap {
    headers.insert(header::AUTHORIZATION, authorization);
    headers
}

/// 上游响应头中去掉传输层相关的头，其余原样透传
pub fn relayable_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in upstream.iter() {
        if is_hop_by_hop(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    // HeaderName 总是小写存储
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}
