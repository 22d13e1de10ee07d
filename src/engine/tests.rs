//! Tests for engine module

use super::*;
use crate::http::HttpClientConfig;
use crate::incremental::CursorFormat;
use crate::types::{LogLevel, Record};
use chrono::TimeZone;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTINGS: &str = "/odata/Property";

fn fixed_clock() -> Clock {
    Arc::new(|| Utc.with_ymd_and_hms(2024, 3, 15, 13, 45, 30).unwrap())
}

fn stream_config(server: &MockServer, format: CursorFormat) -> StreamConfig {
    let mut config = StreamConfig::new(server.uri(), LISTINGS, "ModificationTimestamp");
    config.select = vec!["ListingKey".into(), "ModificationTimestamp".into()];
    config.page_size = Some(2);
    config.cursor_format = format;
    config
}

fn engine(server: &MockServer, config: &StreamConfig, state: Option<StreamState>) -> SyncEngine {
    let client = HttpClient::with_config(HttpClientConfig::builder().base_url(server.uri()).build())
        .unwrap();
    SyncEngine::new(Arc::new(client), config, state).with_clock(fixed_clock())
}

fn listing(key: &str, ts: &str) -> serde_json::Value {
    json!({ "ListingKey": key, "ModificationTimestamp": ts })
}

fn records(messages: &[Message]) -> Vec<Record> {
    messages.iter().filter_map(Message::as_record).cloned().collect()
}

fn states(messages: &[Message]) -> Vec<StreamState> {
    messages.iter().filter_map(Message::as_state).cloned().collect()
}

fn keys(messages: &[Message]) -> Vec<String> {
    records(messages)
        .iter()
        .map(|r| r["ListingKey"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Message Tests
// ============================================================================

#[test]
fn test_message_kinds() {
    let record = json!({ "ListingKey": "1" }).as_object().cloned().unwrap();
    let msg = Message::record("properties", record.clone());
    assert!(msg.is_record());
    assert_eq!(msg.as_record(), Some(&record));
    assert!(msg.as_state().is_none());

    let msg = Message::state("properties", StreamState::from_pairs([("k", "v")]));
    assert!(msg.is_state());
    assert!(!msg.is_record());

    assert!(Message::info("i").is_log());
    assert!(Message::log(LogLevel::Warn, "w").is_log());
}

#[test]
fn test_sync_stats() {
    let mut stats = SyncStats::new();
    stats.add_page(5);
    stats.add_page(3);
    stats.add_record();
    stats.add_record();
    stats.add_state();
    stats.set_duration(1500);

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.records_read, 8);
    assert_eq!(stats.records_emitted, 2);
    assert_eq!(stats.records_filtered(), 6);
    assert_eq!(stats.states_emitted, 1);
    assert_eq!(stats.duration_ms, 1500);
}

// ============================================================================
// Sync Tests
// ============================================================================

#[tokio::test]
async fn test_two_page_sync_without_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTINGS))
        .and(query_param("$top", "2"))
        .and(query_param("$select", "ListingKey,ModificationTimestamp"))
        .and(query_param_is_missing("$skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                listing("A", "2023-01-01T00:00:00Z"),
                listing("B", "2023-01-02T00:00:00Z")
            ],
            "@odata.nextLink": format!("{}{LISTINGS}?$top=2&$skip=2", server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(LISTINGS))
        .and(query_param("$skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [listing("C", "2023-01-03T00:00:00Z")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = stream_config(&server, CursorFormat::spark());
    let messages = engine(&server, &config, None).collect().await.unwrap();

    assert_eq!(keys(&messages), vec!["A", "B", "C"]);
    // First checkpoint comes from the clock, which is ahead of every record
    assert_eq!(
        states(&messages),
        vec![StreamState::from_pairs([(
            "ModificationTimestamp",
            "2024-03-15T13:45:30Z"
        )])]
    );
    assert!(messages.last().unwrap().is_state());
}

#[tokio::test]
async fn test_sync_filters_against_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTINGS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                listing("below", "2022-12-31T23:59:59.999Z"),
                listing("equal", "2023-01-01T00:00:00.000Z"),
                listing("above", "2023-01-01T00:00:00.001Z")
            ]
        })))
        .mount(&server)
        .await;

    let config = stream_config(&server, CursorFormat::bridge());
    let state = StreamState::from_pairs([("ModificationTimestamp", "2023-01-01T00:00:00.000Z")]);
    let messages = engine(&server, &config, Some(state))
        .collect()
        .await
        .unwrap();

    assert_eq!(keys(&messages), vec!["equal", "above"]);
    assert_eq!(
        states(&messages),
        vec![StreamState::from_pairs([(
            "ModificationTimestamp",
            "2023-01-01T00:00:00.001000Z"
        )])]
    );
}

#[tokio::test]
async fn test_sync_without_accepted_records_repeats_prior_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTINGS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [listing("old", "2020-01-01T00:00:00Z")]
        })))
        .mount(&server)
        .await;

    let config = stream_config(&server, CursorFormat::spark());
    let prior = StreamState::from_pairs([("ModificationTimestamp", "2023-01-01T00:00:00Z")]);
    let messages = engine(&server, &config, Some(prior.clone()))
        .collect()
        .await
        .unwrap();

    assert!(records(&messages).is_empty());
    assert_eq!(states(&messages), vec![prior]);
}

#[tokio::test]
async fn test_sync_empty_without_state_emits_no_checkpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTINGS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .mount(&server)
        .await;

    let config = stream_config(&server, CursorFormat::spark());
    let messages = engine(&server, &config, None).collect().await.unwrap();

    assert!(records(&messages).is_empty());
    assert!(states(&messages).is_empty());
}

#[tokio::test]
async fn test_sync_rejects_repeated_continuation_token() {
    let server = MockServer::start().await;
    let looping_link = format!("{}{LISTINGS}?$skip=2", server.uri());

    Mock::given(method("GET"))
        .and(path(LISTINGS))
        .and(query_param_is_missing("$skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [listing("A", "2023-01-01T00:00:00Z")],
            "@odata.nextLink": looping_link
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Keeps pointing at itself
    Mock::given(method("GET"))
        .and(path(LISTINGS))
        .and(query_param("$skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [listing("B", "2023-01-02T00:00:00Z")],
            "@odata.nextLink": looping_link
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = stream_config(&server, CursorFormat::spark());
    let err = engine(&server, &config, None).collect().await.unwrap_err();

    assert!(matches!(err, Error::Pagination { .. }));
}

#[tokio::test]
async fn test_sync_missing_cursor_with_state_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTINGS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "ListingKey": "no-timestamp" }]
        })))
        .mount(&server)
        .await;

    let config = stream_config(&server, CursorFormat::spark());
    let state = StreamState::from_pairs([("ModificationTimestamp", "2023-01-01T00:00:00Z")]);
    let err = engine(&server, &config, Some(state))
        .collect()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingCursorField { .. }));
}

#[tokio::test]
async fn test_sync_http_error_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTINGS))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let config = stream_config(&server, CursorFormat::spark());
    let err = engine(&server, &config, None).collect().await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 401, .. }));
}

#[tokio::test]
async fn test_read_is_lazy() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTINGS))
        .and(query_param_is_missing("$skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [listing("A", "2023-01-01T00:00:00Z")],
            "@odata.nextLink": format!("{}{LISTINGS}?$skip=1", server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Never reached: the consumer stops after the first record
    Mock::given(method("GET"))
        .and(path(LISTINGS))
        .and(query_param("$skip", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let config = stream_config(&server, CursorFormat::spark());
    let mut stream = engine(&server, &config, None).read();

    let first_record = loop {
        let message = stream.next().await.unwrap().unwrap();
        if message.is_record() {
            break message;
        }
    };
    assert_eq!(first_record.as_record().unwrap()["ListingKey"], "A");
}

#[test]
fn test_engine_debug() {
    let config = StreamConfig::new("https://example.com/", "Property", "ts");
    let client = Arc::new(HttpClient::new().unwrap());
    let engine = SyncEngine::new(client, &config, None);
    assert_eq!(engine.stream(), "properties");
    assert!(format!("{engine:?}").contains("SyncEngine"));
}
