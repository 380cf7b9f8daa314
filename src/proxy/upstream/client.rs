// 上游客户端实现
// 单次转发：注入凭据、透传状态码、流式回传响应体

use axum::{
    body::Body,
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;
use std::time::Duration;

use crate::error::{GatewayError, GatewayResult};
use crate::proxy::headers::relayable_response_headers;

/// 错误响应体最多记录的字节数
const ERROR_BODY_PREVIEW_BYTES: usize = 500;

pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl UpstreamClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> GatewayResult<Self> {
        // 不设全局超时；需要时按单次请求设置
        let http_client = Client::builder()
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(http_client, base_url, timeout))
    }

    pub fn with_client(http_client: Client, base_url: &str, timeout: Option<Duration>) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// 拼接目标地址：base + 路径 + 原始查询串（不重新编码）
    pub fn build_url(&self, path: &str, query_string: Option<&str>) -> String {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        match query_string.filter(|q| !q.is_empty()) {
            Some(qs) => format!("{}?{}", url, qs),
            None => url,
        }
    }

    /// 发起一次上游调用；传输层失败映射为 `GatewayError::Upstream`，不重试
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> GatewayResult<reqwest::Response> {
        let mut request = self.http_client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        request.send().await.map_err(|e| {
            tracing::warn!("Upstream request to {} failed: {}", url, e);
            GatewayError::Upstream(e.to_string())
        })
    }

    /// 转发并将响应原样回传给客户端
    pub async fn forward(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> GatewayResult<Response> {
        let body = (!body.is_empty()).then_some(body);
        let response = self.send(method.clone(), url, headers, body).await?;
        let status = response.status();
        tracing::info!("[proxy] {} {} -> {}", method, url, status.as_u16());
        Ok(relay(response))
    }
}

/// 状态码与过滤后的响应头原样透传，响应体以流的形式回传，不做缓冲
pub fn relay(response: reqwest::Response) -> Response {
    let status = response.status();
    let headers = relayable_response_headers(response.headers());
    let stream = response.bytes_stream();

    let body = if status.as_u16() >= 400 {
        Body::from_stream(log_error_preview(stream, status.as_u16()))
    } else {
        Body::from_stream(stream)
    };

    (status, headers, body).into_response()
}

/// 边透传边截取前 500 字节写入日志
fn log_error_preview<S>(
    upstream: S,
    status: u16,
) -> impl Stream<Item = Result<Bytes, reqwest::Error>>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    async_stream::stream! {
        let mut upstream = Box::pin(upstream);
        let mut preview: Vec<u8> = Vec::new();
        let mut logged = false;

        while let Some(chunk) = upstream.next().await {
            if let Ok(bytes) = &chunk {
                if !logged {
                    let take = (ERROR_BODY_PREVIEW_BYTES - preview.len()).min(bytes.len());
                    preview.extend_from_slice(&bytes[..take]);
                    if preview.len() >= ERROR_BODY_PREVIEW_BYTES {
                        log_preview(status, &preview);
                        logged = true;
                    }
                }
            }
            yield chunk;
        }

        if !logged {
            log_preview(status, &preview);
        }
    }
}

fn log_preview(status: u16, preview: &[u8]) {
    tracing::warn!(
        "[proxy] upstream body ({}): {}",
        status,
        String::from_utf8_lossy(preview)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> UpstreamClient {
        UpstreamClient::new(base, None).unwrap()
    }

    #[test]
    fn test_build_url_joins_path_and_query() {
        let c = client("https://api.example.test/api/");
        assert_eq!(
            c.build_url("database/rows/table/5/", None),
            "https://api.example.test/api/database/rows/table/5/"
        );
        assert_eq!(
            c.build_url("database/rows/table/5/", Some("user_field_names=true&size=200")),
            "https://api.example.test/api/database/rows/table/5/?user_field_names=true&size=200"
        );
        assert_eq!(
            c.build_url("/applications/", Some("")),
            "https://api.example.test/api/applications/"
        );
    }

    #[test]
    fn test_query_string_kept_verbatim() {
        let c = client("http://upstream.test");
        assert_eq!(
            c.build_url("x", Some("filter__field_1__contains=a%20b&search=%C5%BC")),
            "http://upstream.test/x?filter__field_1__contains=a%20b&search=%C5%BC"
        );
    }

    #[tokio::test]
    async fn test_deadline_surfaces_as_upstream_error() {
        use crate::proxy::test_support::spawn_upstream;
        use axum::{routing::get, Router};

        let base = spawn_upstream(Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;
        let c = UpstreamClient::new(&base, Some(Duration::from_millis(100))).unwrap();
        let url = c.build_url("slow", None);

        let result = c.forward(Method::GET, &url, HeaderMap::new(), Bytes::new()).await;
        assert!(matches!(result, Err(GatewayError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_error_preview_passes_body_through_untouched() {
        let chunks: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from(vec![b'a'; 400])),
            Ok(Bytes::from(vec![b'b'; 400])),
            Ok(Bytes::from_static(b"tail")),
        ];
        let relayed: Vec<Bytes> = log_error_preview(futures::stream::iter(chunks), 500)
            .map(|c| c.unwrap())
            .collect()
            .await;
        let total: usize = relayed.iter().map(|b| b.len()).sum();
        assert_eq!(relayed.len(), 3);
        assert_eq!(total, 804);
    }
}
