//! Tests for cursor filtering and checkpoint merging

use super::*;
use crate::error::Error;
use crate::state::StreamState;
use crate::types::Record;
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn stamped(field: &str, ts: &str) -> Record {
    record(json!({ "ListingKey": ts, field: ts }))
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 13, 45, 30).unwrap()
}

// ============================================================================
// CursorFormat
// ============================================================================

#[test_case(CursorFormat::bridge(), "2023-01-01T00:00:00.000Z", "2023-01-01T00:00:00.000000Z" ; "bridge millis")]
#[test_case(CursorFormat::bridge(), "2023-01-01T10:20:30Z", "2023-01-01T10:20:30.000000Z" ; "bridge without fraction")]
#[test_case(CursorFormat::spark(), "2023-06-30T23:59:59Z", "2023-06-30T23:59:59Z" ; "spark seconds")]
#[test_case(CursorFormat::trestle(), "2023-01-01T00:00:00.123+0000", "2023-01-01T00:00:00.123000+0000" ; "trestle offset")]
#[test_case(CursorFormat::trestle(), "2023-01-01T00:00:00.5Z", "2023-01-01T00:00:00.500000+0000" ; "trestle zulu")]
fn test_cursor_format_rewrites(format: CursorFormat, input: &str, expected: &str) {
    let parsed = format.parse(input).unwrap();
    assert_eq!(format.format(&parsed).unwrap(), expected);
}

#[test]
fn test_cursor_format_rejects_mismatched_value() {
    let err = CursorFormat::spark()
        .parse("2023-01-01T00:00:00.000Z")
        .unwrap_err();
    match err {
        Error::CursorParse { value, format, .. } => {
            assert_eq!(value, "2023-01-01T00:00:00.000Z");
            assert_eq!(format, "%Y-%m-%dT%H:%M:%SZ");
        }
        other => panic!("Expected CursorParse, got {other:?}"),
    }
}

#[test]
fn test_cursor_format_validate() {
    assert!(CursorFormat::bridge().validate().is_ok());
    assert!(CursorFormat::new("%Y-%Q").validate().is_err());
}

#[test]
fn test_cursor_format_deserialize_without_output() {
    let format: CursorFormat =
        serde_json::from_value(json!({ "parse": "%Y-%m-%dT%H:%M:%SZ" })).unwrap();
    assert_eq!(format, CursorFormat::spark());
    assert_eq!(format.output_pattern(), "%Y-%m-%dT%H:%M:%SZ");
}

#[test]
fn test_initial_checkpoint() {
    let now = fixed_now();
    assert_eq!(InitialCheckpoint::Now.at(now), now);
    assert_eq!(
        InitialCheckpoint::StartOfDay.at(now),
        Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
    );
}

// ============================================================================
// CursorFilter
// ============================================================================

#[test]
fn test_filter_without_state_passes_everything() {
    let records = vec![
        stamped("ModificationTimestamp", "2022-12-31T00:00:00Z"),
        stamped("ModificationTimestamp", "2023-01-02T00:00:00Z"),
        record(json!({ "ListingKey": "no-cursor" })),
    ];

    let filter = CursorFilter::from_state("ModificationTimestamp", "ModificationTimestamp", None);
    let kept: Vec<Record> = filter
        .filter(records.clone())
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(kept, records);
}

#[test]
fn test_filter_state_without_key_passes_everything() {
    let state = StreamState::new();
    let filter = CursorFilter::from_state("ModificationTimestamp", "updated_at", Some(&state));
    assert!(filter.threshold().is_none());
    assert!(filter
        .accepts(&record(json!({ "ListingKey": "1" })))
        .unwrap());
}

#[test]
fn test_filter_keeps_equal_and_newer() {
    let field = "BridgeModificationTimestamp";
    let below = stamped(field, "2022-12-31T23:59:59.999Z");
    let equal = stamped(field, "2023-01-01T00:00:00.000Z");
    let above = stamped(field, "2023-01-01T00:00:00.001Z");

    let state = StreamState::from_pairs([("updated_at", "2023-01-01T00:00:00.000Z")]);
    let filter = CursorFilter::from_state(field, "updated_at", Some(&state));

    let kept: Vec<Record> = filter
        .filter(vec![below, equal.clone(), above.clone()])
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(kept, vec![equal, above]);
}

#[test]
fn test_filter_missing_cursor_with_state_is_fatal() {
    let filter = CursorFilter::new("ModificationTimestamp", Some("2023-01-01T00:00:00Z".into()));
    let mut results = filter.filter(vec![record(json!({ "ListingKey": "1" }))]);

    match results.next() {
        Some(Err(Error::MissingCursorField { field })) => {
            assert_eq!(field, "ModificationTimestamp");
        }
        other => panic!("Expected MissingCursorField, got {other:?}"),
    }
}

#[test]
fn test_filter_non_string_cursor_is_fatal() {
    let filter = CursorFilter::new("ModificationTimestamp", Some("2023".into()));
    let err = filter
        .accepts(&record(json!({ "ModificationTimestamp": 2024 })))
        .unwrap_err();
    assert!(matches!(err, Error::MissingCursorField { .. }));
}

// ============================================================================
// StateMerger
// ============================================================================

#[test]
fn test_merge_without_state_uses_clock() {
    let merger = StateMerger::new(
        "ModificationTimestamp",
        "ModificationTimestamp",
        CursorFormat::spark(),
        InitialCheckpoint::Now,
    );
    let rec = stamped("ModificationTimestamp", "2001-01-01T00:00:00Z");

    let merged = merger.merge(None, &rec, fixed_now()).unwrap();
    assert_eq!(merged, "2024-03-15T13:45:30Z");
}

#[test]
fn test_merge_without_state_start_of_day() {
    let merger = StateMerger::new(
        "BridgeModificationTimestamp",
        "updated_at",
        CursorFormat::bridge(),
        InitialCheckpoint::StartOfDay,
    );
    let rec = stamped("BridgeModificationTimestamp", "2001-01-01T00:00:00.000Z");

    let merged = merger.merge(None, &rec, fixed_now()).unwrap();
    assert_eq!(merged, "2024-03-15T00:00:00.000000Z");
}

#[test_case("2023-01-01T00:00:00Z", "2023-02-01T00:00:00Z", "2023-02-01T00:00:00Z" ; "record newer")]
#[test_case("2023-02-01T00:00:00Z", "2023-01-01T00:00:00Z", "2023-02-01T00:00:00Z" ; "record older")]
#[test_case("2023-02-01T00:00:00Z", "2023-02-01T00:00:00Z", "2023-02-01T00:00:00Z" ; "equal")]
fn test_merge_keeps_max(current: &str, record_value: &str, expected: &str) {
    let merger = StateMerger::new(
        "ModificationTimestamp",
        "ModificationTimestamp",
        CursorFormat::spark(),
        InitialCheckpoint::Now,
    );
    let rec = stamped("ModificationTimestamp", record_value);
    assert_eq!(
        merger.merge(Some(current), &rec, fixed_now()).unwrap(),
        expected
    );
}

#[test]
fn test_merge_is_order_independent() {
    let merger = StateMerger::new(
        "ModificationTimestamp",
        "ModificationTimestamp",
        CursorFormat::trestle(),
        InitialCheckpoint::Now,
    );
    let values = [
        "2023-03-01T08:00:00.000+0000",
        "2023-05-01T08:00:00.250Z",
        "2023-04-01T08:00:00.000+0000",
    ];

    let fold = |order: &[usize]| {
        let mut current = "2023-01-01T00:00:00.000000+0000".to_string();
        for &i in order {
            let rec = stamped("ModificationTimestamp", values[i]);
            current = merger.merge(Some(&current), &rec, fixed_now()).unwrap();
        }
        current
    };

    let expected = "2023-05-01T08:00:00.250000+0000";
    for order in [[0, 1, 2], [2, 1, 0], [1, 0, 2], [2, 0, 1]] {
        assert_eq!(fold(&order), expected);
    }
}

#[test]
fn test_merge_compares_instants_across_offsets() {
    let merger = StateMerger::new(
        "ModificationTimestamp",
        "ModificationTimestamp",
        CursorFormat::trestle(),
        InitialCheckpoint::Now,
    );
    // 10:00+0200 is 08:00 UTC, earlier than the stored 09:00 UTC
    let rec = stamped("ModificationTimestamp", "2023-01-01T10:00:00.000+0200");
    let merged = merger
        .merge(Some("2023-01-01T09:00:00.000+0000"), &rec, fixed_now())
        .unwrap();
    assert_eq!(merged, "2023-01-01T09:00:00.000000+0000");
}

#[test]
fn test_merge_parse_failure_is_fatal() {
    let merger = StateMerger::new(
        "ModificationTimestamp",
        "ModificationTimestamp",
        CursorFormat::spark(),
        InitialCheckpoint::Now,
    );
    let rec = stamped("ModificationTimestamp", "not a timestamp");
    let err = merger
        .merge(Some("2023-01-01T00:00:00Z"), &rec, fixed_now())
        .unwrap_err();
    assert!(matches!(err, Error::CursorParse { .. }));
}

#[test]
fn test_merge_into_state() {
    let merger = StateMerger::new(
        "BridgeModificationTimestamp",
        "updated_at",
        CursorFormat::bridge(),
        InitialCheckpoint::StartOfDay,
    );
    let mut state = StreamState::from_pairs([("updated_at", "2023-01-01T00:00:00.000Z")]);
    let rec = stamped("BridgeModificationTimestamp", "2023-06-01T12:00:00.500Z");

    merger.merge_into(&mut state, &rec, fixed_now()).unwrap();

    assert_eq!(merger.state_key(), "updated_at");
    assert_eq!(state.get("updated_at"), Some("2023-06-01T12:00:00.500000Z"));
}
