//! Tests for pagination module

use super::*;
use crate::decode::JsonDecoder;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// PageToken Tests
// ============================================================================

#[test]
fn test_page_token_with_param() {
    let token = PageToken::with_param("$skip", "200");
    assert_eq!(token.get("$skip"), Some("200"));
    assert!(!token.is_empty());
    assert_eq!(token.to_string(), "$skip=200");
}

#[test]
fn test_merge_params_token_wins() {
    let mut base = BTreeMap::new();
    base.insert("$top".to_string(), "200".to_string());
    base.insert("$skip".to_string(), "0".to_string());

    let merged = merge_params(&base, Some(&PageToken::with_param("$skip", "400")));
    assert_eq!(merged.get("$top"), Some(&"200".to_string()));
    assert_eq!(merged.get("$skip"), Some(&"400".to_string()));

    let first = merge_params(&base, None);
    assert_eq!(first, base);
}

// ============================================================================
// PaginationState Tests
// ============================================================================

#[test]
fn test_pagination_state_counts() {
    let mut state = PaginationState::new();
    state.add_page(200);
    state.add_page(13);
    assert_eq!(state.pages, 2);
    assert_eq!(state.total_fetched, 213);
    assert!(!state.done);
    state.mark_done();
    assert!(state.done);
}

#[test]
fn test_pagination_state_rejects_repeated_token() {
    let mut state = PaginationState::new();
    let token = PageToken::with_param("$skip", "200");

    assert!(state.claim(&token).is_ok());
    assert!(state.claim(&PageToken::with_param("$skip", "400")).is_ok());
    let err = state.claim(&token).unwrap_err();
    assert!(matches!(err, Error::Pagination { .. }));
}

// ============================================================================
// NextLinkPaginator Tests
// ============================================================================

#[test]
fn test_next_link_skip() {
    let paginator = NextLinkPaginator::skip();
    let body = json!({
        "value": [],
        "@odata.nextLink": "https://api.bridgedataoutput.com/api/v2/OData/test/Property?$top=200&$skip=200&$filter=startswith(ListOfficeKey,%20'abc')"
    });

    let token = paginator.next_token(&body).unwrap().unwrap();
    assert_eq!(token, PageToken::with_param("$skip", "200"));
}

#[test]
fn test_next_link_skip_token() {
    let paginator = NextLinkPaginator::skip_token();
    let body = json!({
        "@odata.nextLink": "https://replication.sparkapi.com/Reso/OData/Property?$top=1000&$skiptoken=20230101abc"
    });

    let token = paginator.next_token(&body).unwrap().unwrap();
    assert_eq!(token.get("$skiptoken"), Some("20230101abc"));
    assert_eq!(token.params().len(), 1);
}

#[test]
fn test_next_link_percent_encoded_key() {
    let paginator = NextLinkPaginator::skip();
    let body = json!({"@odata.nextLink": "https://x.example.com/Property?%24skip=1000"});

    let token = paginator.next_token(&body).unwrap().unwrap();
    assert_eq!(token.get("$skip"), Some("1000"));
}

#[test]
fn test_next_link_relative() {
    let paginator = NextLinkPaginator::skip();
    let body = json!({"@odata.nextLink": "Property?$skip=10"});

    let token = paginator.next_token(&body).unwrap().unwrap();
    assert_eq!(token.get("$skip"), Some("10"));
}

#[test]
fn test_next_link_absent_ends_pagination() {
    let paginator = NextLinkPaginator::skip();
    assert!(paginator.next_token(&json!({"value": []})).unwrap().is_none());
    assert!(paginator
        .next_token(&json!({"@odata.nextLink": null}))
        .unwrap()
        .is_none());
    assert!(paginator
        .next_token(&json!({"@odata.nextLink": ""}))
        .unwrap()
        .is_none());
}

#[test]
fn test_next_link_without_continuation_key_is_error() {
    let paginator = NextLinkPaginator::skip();
    let body = json!({"@odata.nextLink": "https://x.example.com/Property?$top=200"});

    let err = paginator.next_token(&body).unwrap_err();
    assert!(matches!(err, Error::Pagination { .. }));
}

// ============================================================================
// PageFetcher Tests
// ============================================================================

fn fetcher_for(server: &MockServer) -> PageFetcher {
    let config = HttpClientConfig::builder().base_url(server.uri()).build();
    let client = Arc::new(HttpClient::with_config(config).unwrap());

    let mut base = BTreeMap::new();
    base.insert("$select".to_string(), "ListingKey,ModificationTimestamp".to_string());
    base.insert("$top".to_string(), "2".to_string());

    PageFetcher::new(
        client,
        "/odata/Property",
        base,
        Box::new(JsonDecoder::new()),
        Box::new(NextLinkPaginator::skip()),
    )
}

#[tokio::test]
async fn test_fetch_first_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/odata/Property"))
        .and(query_param("$top", "2"))
        .and(query_param_is_missing("$skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"ListingKey": "1"}, {"ListingKey": "2"}],
            "@odata.nextLink": format!("{}/odata/Property?$top=2&$skip=2", mock_server.uri())
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher_for(&mock_server);
    let page = fetcher.fetch_page(None).await.unwrap();

    assert_eq!(page.records.len(), 2);
    assert_eq!(page.next, Some(PageToken::with_param("$skip", "2")));
    assert!(!page.is_last());
}

#[tokio::test]
async fn test_fetch_continuation_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/odata/Property"))
        .and(query_param("$skip", "2"))
        .and(query_param("$select", "ListingKey,ModificationTimestamp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"ListingKey": "3"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher_for(&mock_server);
    let page = fetcher
        .fetch_page(Some(&PageToken::with_param("$skip", "2")))
        .await
        .unwrap();

    assert_eq!(page.records.len(), 1);
    assert!(page.is_last());
}

#[tokio::test]
async fn test_fetch_page_http_error_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/odata/Property"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher_for(&mock_server);
    let err = fetcher.fetch_page(None).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
}
