//! Tests for pagination module

use super::*;
use crate::client::Client;
use crate::error::Error;
use crate::http::ApiResponse;
use crate::types::Params;
use serde_json::json;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// OffsetPaginator Tests
// ============================================================================

#[test_case(2, 5 => vec![2, 4] ; "partial last page")]
#[test_case(2, 4 => vec![2] ; "exact multiple")]
#[test_case(500, 500 => Vec::<u64>::new() ; "total equals limit")]
#[test_case(500, 3 => Vec::<u64>::new() ; "single short page")]
#[test_case(10, 0 => Vec::<u64>::new() ; "empty collection")]
fn test_remaining_offsets(limit: u32, total: u64) -> Vec<u64> {
    OffsetPaginator::new(limit)
        .unwrap()
        .remaining_offsets(total)
        .unwrap()
}

#[test]
fn test_remaining_offsets_large_page_size() {
    let paginator = OffsetPaginator::new(u32::MAX).unwrap();
    let step = u64::from(u32::MAX);
    let total = step * 3 + 1;
    assert_eq!(
        paginator.remaining_offsets(total).unwrap(),
        vec![step, step * 2, step * 3]
    );
}

#[test_case(1, u64::MAX ; "max total")]
#[test_case(1, MAX_PAGES + 1 ; "one page over the bound")]
fn test_remaining_offsets_rejects_oversized_total(limit: u32, total: u64) {
    let err = OffsetPaginator::new(limit)
        .unwrap()
        .remaining_offsets(total)
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[test]
fn test_params_for_keeps_caller_params() {
    let paginator = OffsetPaginator::new(50).unwrap();
    let mut params = Params::new();
    params.insert("status".to_string(), "open".to_string());
    params.insert(OFFSET_PARAM.to_string(), "999".to_string());

    let page_params = paginator.params_for(&params, 100);

    assert_eq!(page_params.get("status"), Some(&"open".to_string()));
    assert_eq!(page_params.get(OFFSET_PARAM), Some(&"100".to_string()));
    assert_eq!(page_params.get(LIMIT_PARAM), Some(&"50".to_string()));
    // Caller's params are untouched
    assert_eq!(params.get(OFFSET_PARAM), Some(&"999".to_string()));
}

#[test]
fn test_zero_limit_rejected() {
    assert!(matches!(OffsetPaginator::new(0), Err(Error::Config { .. })));
}

#[test]
fn test_page_from_response() {
    let page = Page::from_response(ApiResponse::new(
        200,
        json!({ "result": [{ "id": 1 }], "pagination": { "total": 7 } }),
    ))
    .unwrap();
    assert_eq!(page.result, vec![json!({ "id": 1 })]);
    assert_eq!(page.pagination, PageInfo { total: 7 });

    // Missing result is an empty page
    let page = Page::from_response(ApiResponse::new(200, json!({ "pagination": { "total": 0 } })))
        .unwrap();
    assert!(page.result.is_empty());

    let err = Page::from_response(ApiResponse::new(200, json!({ "result": [] }))).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

// ============================================================================
// index_all Tests
// ============================================================================

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "t" })))
        .mount(server)
        .await;
}

fn page(items: &[i64], total: u64) -> ResponseTemplate {
    let result: Vec<_> = items.iter().map(|id| json!({ "id": id })).collect();
    ResponseTemplate::new(200).set_body_json(json!({
        "result": result,
        "pagination": { "total": total }
    }))
}

fn client_for(server: &MockServer, max_limit: u32) -> Client {
    Client::builder(server.uri())
        .configure(|settings| {
            settings
                .set_client_credentials("client", "secret")
                .set_max_limit(max_limit);
        })
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_index_all_concatenates_pages_in_offset_order() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "2"))
        .and(query_param("status", "open"))
        .respond_with(page(&[1, 2], 5))
        .expect(1)
        .mount(&server)
        .await;
    // The middle page answers last
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("offset", "2"))
        .respond_with(page(&[3, 4], 5).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("offset", "4"))
        .respond_with(page(&[5], 5))
        .expect(1)
        .mount(&server)
        .await;

    let mut params = Params::new();
    params.insert("status".to_string(), "open".to_string());
    let items = client_for(&server, 2).index_all("items", &params).await.unwrap();

    let ids: Vec<i64> = items.iter().filter_map(|item| item["id"].as_i64()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_index_all_single_page() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "500"))
        .respond_with(page(&[1, 2, 3], 3))
        .expect(1)
        .mount(&server)
        .await;

    let items = client_for(&server, 500)
        .index_all("items", &Params::new())
        .await
        .unwrap();
    assert_eq!(items.len(), 3);
}

#[tokio::test]
async fn test_index_all_empty_collection() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(page(&[], 0))
        .expect(1)
        .mount(&server)
        .await;

    let items = client_for(&server, 10)
        .index_all("items", &Params::new())
        .await
        .unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_index_all_fails_when_any_page_fails() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("offset", "0"))
        .respond_with(page(&[1, 2], 6))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("offset", "4"))
        .respond_with(page(&[5, 6], 6))
        .mount(&server)
        .await;

    let err = client_for(&server, 2)
        .index_all("items", &Params::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_index_all_rejects_non_page_body() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": [1, 2] })))
        .mount(&server)
        .await;

    let err = client_for(&server, 2)
        .index_all("items", &Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_index_all_zero_limit_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(page(&[], 0))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, 10);
    client.update_settings(|settings| settings.max_limit = 0).await;

    let err = client.index_all("items", &Params::new()).await.unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[tokio::test]
async fn test_index_all_rejects_oversized_total() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(page(&[1], u64::MAX))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, 1)
        .index_all("items", &Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}
