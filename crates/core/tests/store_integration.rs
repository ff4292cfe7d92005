//! Integration tests for the versioned store
//!
//! These tests verify end-to-end storage behavior including:
//! - Round trips and fail-soft reads
//! - Migration ordering, idempotence and failure handling
//! - Namespace and flow isolation
//! - Export/import, expiry sweeps and size accounting
//! - Backend failures surfacing as store errors

use std::time::Duration;

use flowstash_common::error::ErrorClassification;
use flowstash_common::testing::FailureMode;
use flowstash_core::{Migration, MigrationChain, StoreError};
use serde_json::{json, Value};

mod support;

use support::Harness;

fn value_chain() -> MigrationChain {
    MigrationChain::new()
        .with(Migration::infallible(2, 3, |data| {
            json!({ "value": data["value"].as_i64().unwrap_or_default() + 10 })
        }))
        .with(Migration::infallible(1, 2, |data| {
            json!({ "value": data["value"].as_i64().unwrap_or_default() * 2 })
        }))
}

// ============================================================================
// Round trip and fail-soft reads
// ============================================================================

/// Validates that arbitrary JSON payloads survive a save/load round trip.
#[test]
fn test_round_trip_preserves_payloads() {
    let harness = Harness::new();
    let payloads = [
        json!(null),
        json!("plain string"),
        json!(42.5),
        json!([1, "two", {"three": 3}]),
        json!({"nested": {"deep": [true, false]}, "unicode": "żółw"}),
    ];

    for (idx, payload) in payloads.iter().enumerate() {
        let key = format!("v8:payload-{idx}");
        harness.store.save(&key, payload.clone(), 1, None).unwrap();
        assert_eq!(harness.store.load(&key).unwrap().as_ref(), Some(payload));
    }
}

/// Validates that a non-JSON value under a managed key loads as `None`.
#[test]
fn test_fail_soft_read() {
    let harness = Harness::new();
    harness.put_raw("v8:tokens", "definitely not json");

    assert_eq!(harness.store.load("v8:tokens").unwrap(), None);
    assert_eq!(harness.store.load_envelope("v8:tokens").unwrap(), None);
    assert_eq!(harness.store.get_age("v8:tokens").unwrap(), None);
    assert!(harness.store.get_flow_data("any").unwrap().is_empty());
}

/// Validates that a missing key loads as `None`.
#[test]
fn test_missing_key_loads_none() {
    let harness = Harness::new();
    assert_eq!(harness.store.load("v8:nothing").unwrap(), None);
    assert!(!harness.store.has("v8:nothing").unwrap());
}

// ============================================================================
// Migrations
// ============================================================================

/// Validates ordered migration `{value: 1}` -> `{value: 12}`.
///
/// Assertions:
/// - Confirms the result is `{value: 12}`, not an ordering artifact.
/// - Confirms the envelope is re-persisted at version 3.
#[test]
fn test_migration_ordering() {
    let harness = Harness::new();
    harness.store.save("v8:counter", json!({"value": 1}), 1, None).unwrap();

    let loaded = harness.store.load_with("v8:counter", &value_chain()).unwrap();
    assert_eq!(loaded, Some(json!({"value": 12})));

    let envelope = harness.store.load_envelope("v8:counter").unwrap().unwrap();
    assert_eq!(envelope.version, 3);
    assert_eq!(envelope.data, json!({"value": 12}));
}

/// Validates that loading twice does not apply migrations twice.
#[test]
fn test_migration_idempotence() {
    let harness = Harness::new();
    harness.store.save("v8:counter", json!({"value": 1}), 1, None).unwrap();
    let chain = value_chain();

    let first = harness.store.load_with("v8:counter", &chain).unwrap();
    let second = harness.store.load_with("v8:counter", &chain).unwrap();
    assert_eq!(first, second);
    assert_eq!(second, Some(json!({"value": 12})));
}

/// Validates that data saved at the current version is not migrated.
#[test]
fn test_skip_when_current() {
    let harness = Harness::new();
    harness.store.save("v8:counter", json!({"value": 7}), 2, None).unwrap();
    let chain = MigrationChain::new().with(Migration::infallible(1, 2, |_| json!("migrated")));

    let loaded = harness.store.load_with("v8:counter", &chain).unwrap();
    assert_eq!(loaded, Some(json!({"value": 7})));
    assert_eq!(harness.store.load_envelope("v8:counter").unwrap().unwrap().version, 2);
}

/// Validates that a failing migration errors and leaves storage untouched.
#[test]
fn test_failing_migration_keeps_old_version() {
    let harness = Harness::new();
    harness.store.save("v8:counter", json!({"value": 1}), 1, Some("implicit")).unwrap();
    let raw_before = harness.raw("v8:counter");

    let chain = MigrationChain::new()
        .with(Migration::infallible(1, 2, |data| data))
        .with(Migration::new(2, 3, |_| Err("cannot upgrade".to_string())));

    let err = harness.store.load_with("v8:counter", &chain).unwrap_err();
    assert!(matches!(err, StoreError::Migration { from: 2, to: 3, .. }));
    assert_eq!(harness.raw("v8:counter"), raw_before);
}

/// Validates that a failed write-back of a migrated envelope is reported.
///
/// Assertions:
/// - Ensures `load_with` returns `StoreError::Write` instead of the migrated
///   data.
/// - Confirms the stored envelope is still at version 1.
/// - Confirms the next read after recovery migrates and persists.
#[test]
fn test_migration_write_back_failure_surfaces() {
    let harness = Harness::new();
    harness.store.save("v8:prefs", json!({"value": 4}), 1, Some("A")).unwrap();
    let raw_before = harness.raw("v8:prefs");

    harness.faulty.set_mode(FailureMode::Writes);
    let err = harness.store.load_with("v8:prefs", &value_chain()).unwrap_err();
    assert!(matches!(err, StoreError::Write { ref key, .. } if key == "v8:prefs"));
    assert_eq!(harness.raw("v8:prefs"), raw_before);
    assert_eq!(harness.store.load_envelope("v8:prefs").unwrap().unwrap().version, 1);

    harness.faulty.set_mode(FailureMode::None);
    let loaded = harness.store.load_with("v8:prefs", &value_chain()).unwrap();
    assert_eq!(loaded, Some(json!({"value": 18})));
    assert_eq!(harness.store.load_envelope("v8:prefs").unwrap().unwrap().version, 3);
}

/// Validates that migration re-persists the flow tag.
#[test]
fn test_migration_keeps_flow_tag() {
    let harness = Harness::new();
    harness.store.save("v8:counter", json!({"value": 1}), 1, Some("hybrid")).unwrap();

    harness.store.load_with("v8:counter", &value_chain()).unwrap();

    let entries = harness.store.get_flow_data("hybrid").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].envelope.version, 3);
}

// ============================================================================
// Isolation
// ============================================================================

/// Validates that `clear_all` never touches keys outside the prefix.
#[test]
fn test_namespace_isolation() {
    let harness = Harness::new();
    harness.store.save("v8:tokens", json!({}), 1, None).unwrap();
    harness.store.save("v8:credentials", json!({}), 1, Some("implicit")).unwrap();
    harness.put_raw("v8:corrupt", "oops");
    harness.put_raw("other-app:settings", "keep me");
    harness.put_raw("worker_token", "keep me too");

    assert_eq!(harness.store.clear_all().unwrap(), 3);
    assert!(harness.store.get_all_keys().unwrap().is_empty());
    assert_eq!(harness.raw("other-app:settings").as_deref(), Some("keep me"));
    assert_eq!(harness.raw("worker_token").as_deref(), Some("keep me too"));
}

/// Validates that clearing one flow leaves other flows unchanged.
#[test]
fn test_flow_isolation() {
    let harness = Harness::new();
    harness.store.save("v8:a:one", json!(1), 1, Some("A")).unwrap();
    harness.store.save("v8:a:two", json!(2), 1, Some("A")).unwrap();
    harness.store.save("v8:b:one", json!({"keep": true}), 1, Some("B")).unwrap();
    harness.store.save("v8:untagged", json!(3), 1, None).unwrap();

    assert_eq!(harness.store.clear_flow_data("A").unwrap(), 2);
    assert!(harness.store.get_flow_data("A").unwrap().is_empty());
    assert_eq!(harness.store.load("v8:b:one").unwrap(), Some(json!({"keep": true})));
    assert_eq!(harness.store.load("v8:untagged").unwrap(), Some(json!(3)));
}

/// Validates that a failing delete reports how many keys were cleared.
#[test]
fn test_clear_flow_data_partial_failure() {
    let harness = Harness::new();
    for idx in 0..3 {
        harness.store.save(&format!("v8:a:{idx}"), json!(idx), 1, Some("A")).unwrap();
    }
    harness.faulty.fail_removes_after(1);

    let err = harness.store.clear_flow_data("A").unwrap_err();
    assert!(matches!(err, StoreError::PartialClear { cleared: 1, .. }));
    assert_eq!(harness.store.get_flow_data("A").unwrap().len(), 2);
}

// ============================================================================
// Write failures
// ============================================================================

/// Validates that a write rejected by the quota surfaces and leaves the
/// previous value readable.
#[test]
fn test_failed_write_keeps_previous_value() {
    let harness = Harness::with_quota(120);
    harness.store.save("v8:tokens", json!({"access_token": "abc"}), 1, None).unwrap();

    let big = json!({"access_token": "x".repeat(200)});
    let err = harness.store.save("v8:tokens", big, 1, None).unwrap_err();
    assert!(matches!(err, StoreError::Write { .. }));
    assert!(!err.is_retryable());
    assert_eq!(harness.store.load("v8:tokens").unwrap(), Some(json!({"access_token": "abc"})));
}

/// Validates availability probing and errors when storage is disabled.
#[test]
fn test_unavailable_storage() {
    let harness = Harness::new();
    assert!(harness.store.is_available());

    harness.faulty.set_mode(FailureMode::Unavailable);
    assert!(!harness.store.is_available());
    assert!(matches!(harness.store.load("v8:tokens"), Err(StoreError::Unavailable(_))));
    assert!(matches!(harness.store.save("v8:tokens", json!(1), 1, None), Err(StoreError::Write { .. })));
}

// ============================================================================
// Export / import
// ============================================================================

/// Validates the export document shape.
#[test]
fn test_export_document_shape() {
    let harness = Harness::new();
    harness.store.save("v8:tokens", json!({"a": 1}), 2, Some("implicit")).unwrap();
    harness.put_raw("v8:garbage", "not json");
    harness.put_raw("elsewhere", "{}");

    let exported: Value = serde_json::from_str(&harness.store.export_all().unwrap()).unwrap();
    assert_eq!(exported["version"], 1);
    assert_eq!(exported["exportedAt"], "2024-01-01T00:00:00Z");
    assert_eq!(exported["data"]["v8:tokens"]["version"], 2);
    assert_eq!(exported["data"]["v8:tokens"]["flowKey"], "implicit");
    assert!(exported["data"].get("v8:garbage").is_none());
    assert!(exported["data"].get("elsewhere").is_none());
}

/// Validates export followed by import into an empty store.
#[test]
fn test_export_import_restores_entries() -> anyhow::Result<()> {
    let source = Harness::new();
    source.store.save("v8:tokens", json!({"a": 1}), 1, Some("implicit"))?;
    source.store.save("v8:credentials", json!({"clientId": "x"}), 3, None)?;
    let document = source.store.export_all()?;

    let target = Harness::new();
    let report = target.store.import_all(&document, false)?;
    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 0);
    assert_eq!(target.store.load("v8:credentials")?, Some(json!({"clientId": "x"})));
    assert_eq!(target.store.get_flow_data("implicit")?.len(), 1);
    Ok(())
}

/// Validates the overwrite flag.
///
/// Assertions:
/// - Ensures existing keys are kept without `overwrite`.
/// - Ensures existing keys are replaced with `overwrite`.
#[test]
fn test_import_overwrite_flag() {
    let harness = Harness::new();
    harness.store.save("v8:tokens", json!("old"), 1, None).unwrap();
    let document = r#"{
        "version": 1,
        "exportedAt": "2024-01-01T00:00:00Z",
        "data": {"v8:tokens": {"version": 1, "data": "new", "timestamp": 5}}
    }"#;

    let report = harness.store.import_all(document, false).unwrap();
    assert_eq!((report.imported, report.skipped), (0, 1));
    assert_eq!(harness.store.load("v8:tokens").unwrap(), Some(json!("old")));

    let report = harness.store.import_all(document, true).unwrap();
    assert_eq!((report.imported, report.skipped), (1, 0));
    assert_eq!(harness.store.load("v8:tokens").unwrap(), Some(json!("new")));
}

/// Validates that malformed import documents are rejected.
#[test]
fn test_import_rejects_malformed_documents() {
    let harness = Harness::new();
    let documents = [
        "not json",
        "[1, 2, 3]",
        r#"{"data": {}}"#,
        r#"{"version": 0, "data": {}}"#,
        r#"{"version": "1", "data": {}}"#,
        r#"{"version": 1}"#,
        r#"{"version": 1, "data": []}"#,
    ];

    for document in documents {
        let err = harness.store.import_all(document, true).unwrap_err();
        assert!(matches!(err, StoreError::ImportFormat(_)), "accepted {document}");
    }
}

/// Validates that foreign keys and invalid envelopes are skipped.
#[test]
fn test_import_skips_foreign_and_invalid_entries() {
    let harness = Harness::new();
    let document = json!({
        "version": 1,
        "data": {
            "v8:good": {"version": 1, "data": 1, "timestamp": 1},
            "v8:bad": {"nope": true},
            "foreign": {"version": 1, "data": 1, "timestamp": 1}
        }
    })
    .to_string();

    let report = harness.store.import_all(&document, true).unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(harness.raw("foreign"), None);
}

// ============================================================================
// Size and expiry
// ============================================================================

/// Validates that size counts key and value lengths of managed keys only.
#[test]
fn test_get_size() {
    let harness = Harness::new();
    harness.put_raw("v8:a", "12345");
    harness.put_raw("v8:bb", "1");
    harness.put_raw("outside", "1234567890");

    assert_eq!(harness.store.get_size().unwrap(), (4 + 5) + (5 + 1));
}

/// Validates that the sweep removes old and corrupt entries only.
#[test]
fn test_cleanup_expired() {
    let harness = Harness::new();
    harness.store.save("v8:old", json!(1), 1, None).unwrap();
    harness.clock.advance(Duration::from_secs(60));
    harness.store.save("v8:fresh", json!(2), 1, None).unwrap();
    harness.put_raw("v8:corrupt", "???");
    harness.put_raw("outside", "???");
    harness.clock.advance(Duration::from_secs(1));

    assert_eq!(harness.store.get_age("v8:old").unwrap(), Some(61_000));
    assert_eq!(harness.store.cleanup_expired(30_000).unwrap(), 2);
    assert_eq!(harness.store.get_all_keys().unwrap(), vec!["v8:fresh".to_string()]);
    assert!(harness.raw("outside").is_some());
}
