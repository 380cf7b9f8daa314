//! 多 workspace 表格列表聚合
//! 对每个凭据并发请求同一地址，合并成功结果并标注来源下标

use axum::http::{HeaderMap, Method};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::credentials::{Credential, CredentialStore};
use super::headers::with_authorization;
use super::upstream::UpstreamClient;

/// 触发聚合的固定路径
pub const AGGREGATION_PATH: &str = "database/tables/all-tables";

/// 标注来源凭据下标的字段名
pub const SOURCE_INDEX_FIELD: &str = "source_index";

/// 仅 GET、路径匹配且未显式指定凭据时聚合
pub fn should_aggregate(method: &Method, path: &str, requested_index: Option<i64>) -> bool {
    method == Method::GET
        && requested_index.is_none()
        && path.trim_end_matches('/') == AGGREGATION_PATH
}

#[derive(Deserialize)]
struct PaginatedBody {
    results: Vec<Value>,
}

/// 上游列表响应的形态
#[derive(Debug, PartialEq)]
pub enum Listing {
    Array(Vec<Value>),
    Paginated(Vec<Value>),
    Unrecognized,
}

impl Listing {
    /// 先按数组解析，再按 `{results: [...]}` 解析，否则视为无法识别
    pub fn decode(body: &[u8]) -> Self {
        if let Ok(items) = serde_json::from_slice::<Vec<Value>>(body) {
            return Listing::Array(items);
        }
        if let Ok(page) = serde_json::from_slice::<PaginatedBody>(body) {
            return Listing::Paginated(page.results);
        }
        Listing::Unrecognized
    }

    /// 只保留对象元素
    pub fn into_items(self) -> Vec<Map<String, Value>> {
        let values = match self {
            Listing::Array(values) | Listing::Paginated(values) => values,
            Listing::Unrecognized => return Vec::new(),
        };
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }
}

/// 写入来源下标；上游已有同名字段时保持原值
pub fn tag_source(items: &mut [Map<String, Value>], index: usize) {
    for item in items.iter_mut() {
        item.entry(SOURCE_INDEX_FIELD)
            .or_insert_with(|| Value::from(index));
    }
}

/// 对所有凭据扇出并合并。单个凭据失败只会被跳过，全部失败时返回空列表。
pub async fn aggregate(
    upstream: &UpstreamClient,
    credentials: &CredentialStore,
    url: &str,
    base_headers: &HeaderMap,
) -> Vec<Value> {
    let calls = credentials
        .iter()
        .map(|(index, credential)| fetch_listing(upstream, url, base_headers, index, credential));

    // 等待全部完成，按凭据顺序合并
    let listings = join_all(calls).await;

    let mut merged = Vec::new();
    for (index, listing) in listings.into_iter().enumerate() {
        let Some(listing) = listing else { continue };
        let mut items = listing.into_items();
        tag_source(&mut items, index);
        merged.extend(items.into_iter().map(Value::Object));
    }

    tracing::debug!(
        "Aggregated {} items from {} credentials",
        merged.len(),
        credentials.len()
    );
    merged
}

async fn fetch_listing(
    upstream: &UpstreamClient,
    url: &str,
    base_headers: &HeaderMap,
    index: usize,
    credential: &Credential,
) -> Option<Listing> {
    let authorization = match credential.to_header() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Skipping credential {}: {}", index, e);
            return None;
        }
    };
    let headers = with_authorization(base_headers.clone(), authorization);

    let response = match upstream.send(Method::GET, url, headers, None).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("[proxy] GET {} (token_index={}) failed: {}", url, index, e);
            return None;
        }
    };
    let status = response.status();
    tracing::info!("[proxy] GET {} (token_index={}) -> {}", url, index, status.as_u16());

    if !status.is_success() {
        return None;
    }
    match response.bytes().await {
        Ok(body) => Some(Listing::decode(&body)),
        Err(e) => {
            tracing::warn!("Failed to read listing body for credential {}: {}", index, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::test_support::spawn_upstream;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    fn objects(values: Value) -> Vec<Map<String, Value>> {
        Listing::decode(values.to_string().as_bytes()).into_items()
    }

    #[test]
    fn test_should_aggregate_only_for_plain_get() {
        assert!(should_aggregate(&Method::GET, "database/tables/all-tables", None));
        assert!(should_aggregate(&Method::GET, "database/tables/all-tables/", None));
        assert!(!should_aggregate(&Method::GET, "database/tables/all-tables/", Some(0)));
        assert!(!should_aggregate(&Method::POST, "database/tables/all-tables/", None));
        assert!(!should_aggregate(&Method::GET, "database/tables/5/", None));
        assert!(!should_aggregate(&Method::GET, "/database/tables/all-tables/", None));
    }

    #[test]
    fn test_decode_shapes() {
        assert_eq!(Listing::decode(b"[1, {\"a\": 1}]").into_items().len(), 1);
        assert!(matches!(
            Listing::decode(b"{\"count\": 1, \"results\": [{\"id\": 1}]}"),
            Listing::Paginated(_)
        ));
        assert_eq!(Listing::decode(b"{\"results\": 5}"), Listing::Unrecognized);
        assert_eq!(Listing::decode(b"{\"id\": 1}"), Listing::Unrecognized);
        assert_eq!(Listing::decode(b"<html>"), Listing::Unrecognized);
    }

    #[test]
    fn test_existing_source_index_preserved() {
        let mut items = objects(json!([{"id": 1, "source_index": "upstream"}, {"id": 2}]));
        tag_source(&mut items, 3);
        assert_eq!(items[0]["source_index"], json!("upstream"));
        assert_eq!(items[1]["source_index"], json!(3));
    }

    async fn listing_handler(headers: HeaderMap) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        match auth {
            "Token ws0" => (StatusCode::OK, Json(json!([{"id": 1}, {"id": 2}]))),
            "Token ws2" => (
                StatusCode::OK,
                Json(json!({"count": 3, "results": [{"id": 3}, {"id": 4}, {"id": 5}]})),
            ),
            _ => (StatusCode::FORBIDDEN, Json(json!({"error": "ERROR_NO_PERMISSION"}))),
        }
    }

    fn fixture(base: &str, tokens: &str) -> (UpstreamClient, CredentialStore) {
        (
            UpstreamClient::new(base, None).unwrap(),
            CredentialStore::from_config(Some(tokens), None).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_partial_failure_merges_in_credential_order() {
        let base = spawn_upstream(Router::new().route(
            "/database/tables/all-tables/",
            get(listing_handler),
        ))
        .await;
        let (upstream, store) = fixture(&base, "ws0,ws1,ws2");
        let url = upstream.build_url("database/tables/all-tables/", None);

        let merged = aggregate(&upstream, &store, &url, &HeaderMap::new()).await;

        assert_eq!(merged.len(), 5);
        let tagged: Vec<(i64, i64)> = merged
            .iter()
            .map(|v| (v["id"].as_i64().unwrap(), v["source_index"].as_i64().unwrap()))
            .collect();
        assert_eq!(tagged, vec![(1, 0), (2, 0), (3, 2), (4, 2), (5, 2)]);
    }

    #[tokio::test]
    async fn test_total_failure_yields_empty_list() {
        let base = spawn_upstream(Router::new().route(
            "/database/tables/all-tables/",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        ))
        .await;
        let (upstream, store) = fixture(&base, "a,b");
        let url = upstream.build_url("database/tables/all-tables/", None);

        let merged = aggregate(&upstream, &store, &url, &HeaderMap::new()).await;
        assert!(merged.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_yields_empty_list() {
        let (upstream, store) = fixture("http://127.0.0.1:1", "a");
        let url = upstream.build_url("database/tables/all-tables/", None);

        let merged = aggregate(&upstream, &store, &url, &HeaderMap::new()).await;
        assert!(merged.is_empty());
    }
}
