// `/token/{path}` 转发处理器

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::error::GatewayResult;
use crate::proxy::aggregator::{aggregate, should_aggregate};
use crate::proxy::credentials::requested_index;
use crate::proxy::headers::{forwardable_request_headers, with_authorization};
use crate::state::AppState;

const ROUTE_PREFIX: &str = "/token/";

pub async fn handle_token_proxy(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> GatewayResult<Response> {
    // 使用原始路径，避免路径参数被解码后再转发
    let path = uri
        .path()
        .strip_prefix(ROUTE_PREFIX)
        .unwrap_or_default();
    let url = state.upstream.build_url(path, uri.query());
    let token_index = requested_index(&headers);
    let base_headers = forwardable_request_headers(&headers);

    if should_aggregate(&method, path, token_index) {
        let merged = aggregate(&state.upstream, &state.credentials, &url, &base_headers).await;
        return Ok(Json(Value::Array(merged)).into_response());
    }

    let credential = state.credentials.select(token_index);
    let forward_headers = with_authorization(base_headers, credential.to_header()?);

    state
        .upstream
        .forward(method, &url, forward_headers, body)
        .await
}
