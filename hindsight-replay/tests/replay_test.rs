//! Diff merge + existence: point-in-time state reconstruction scenarios.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use hindsight_core::errors::ReplayError;
use hindsight_core::models::ActionKind::*;
use hindsight_core::models::{EntityId, UpperBound};
use hindsight_core::HindsightError;
use hindsight_replay::ReplayEngine;
use test_fixtures::{blog_world, MemoryEventLog};

fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 12, n, 0, 0, 0).unwrap()
}

fn id(n: i64) -> EntityId {
    EntityId::Int(n)
}

// ── Version-bounded reconstruction ───────────────────────────────────────

#[test]
fn recreates_each_version_of_a_user() {
    let mut log = MemoryEventLog::new();
    log.push(
        Created,
        "user",
        1,
        json!({"name": "John Doe", "email": "john@example.net"}),
        day(1),
    );
    log.push(
        Updated,
        "user",
        1,
        json!({"name": "John Delano Doe", "phone": "9876543210"}),
        day(5),
    );
    log.push(Deleted, "user", 1, json!({}), day(10));
    log.push(Restored, "user", 1, json!({}), day(15));

    let world = blog_world();
    let engine = ReplayEngine::new(&log, &world);

    let john = engine
        .reconstruct_at("user", &id(1), &UpperBound::Version(1))
        .unwrap()
        .unwrap();
    assert_eq!(john.get("name"), Some(&json!("John Doe")));
    assert_eq!(john.get("email"), Some(&json!("john@example.net")));
    assert_eq!(john.get("phone"), None);
    assert!(john.exists);

    let john = engine
        .reconstruct_at("user", &id(1), &UpperBound::Version(3))
        .unwrap()
        .unwrap();
    assert_eq!(john.get("name"), Some(&json!("John Delano Doe")));
    assert_eq!(john.get("phone"), Some(&json!("9876543210")));
    assert!(john.trashed());
    assert!(john.get("deleted_at").is_some_and(|v| v.is_string()));

    let john = engine
        .reconstruct_at("user", &id(1), &UpperBound::Version(4))
        .unwrap()
        .unwrap();
    assert!(!john.trashed());
    assert_eq!(john.get("deleted_at"), Some(&json!(null)));
    assert_eq!(john.get("name"), Some(&json!("John Delano Doe")));
    assert_eq!(john.get("phone"), Some(&json!("9876543210")));
}

// ── Time-bounded reconstruction ──────────────────────────────────────────

#[test]
fn recreates_at_a_given_time() {
    let mut log = MemoryEventLog::new();
    log.push(
        Created,
        "user",
        1,
        json!({"name": "John Doe", "email": "john@example.net"}),
        day(1),
    );
    log.push(
        Updated,
        "user",
        1,
        json!({"name": "John Delano Doe", "phone": "9876543210"}),
        day(5),
    );
    log.push(Deleted, "user", 1, json!({}), day(10));
    log.push(Restored, "user", 1, json!({}), day(15));
    log.push(ForceDeleted, "user", 1, json!({}), day(25));

    let world = blog_world();
    let engine = ReplayEngine::new(&log, &world);

    // Before any history existed.
    let before = Utc.with_ymd_and_hms(2020, 11, 30, 0, 0, 0).unwrap();
    assert!(engine
        .reconstruct_at("user", &id(1), &UpperBound::At(before))
        .unwrap()
        .is_none());

    let john = engine
        .reconstruct_at("user", &id(1), &UpperBound::At(day(20)))
        .unwrap()
        .unwrap();
    assert_eq!(john.get("name"), Some(&json!("John Delano Doe")));
    assert_eq!(john.get("phone"), Some(&json!("9876543210")));
    assert!(!john.trashed());

    // Soft-deleted at the bound: attributes intact, marker set.
    let john = engine
        .reconstruct_at("user", &id(1), &UpperBound::At(day(10)))
        .unwrap()
        .unwrap();
    assert_eq!(john.get("name"), Some(&json!("John Delano Doe")));
    assert!(john.trashed());

    // Force-deleted: gone for good.
    assert!(engine
        .reconstruct_at("user", &id(1), &UpperBound::At(day(25)))
        .unwrap()
        .is_none());
    assert!(engine
        .reconstruct_at("user", &id(1), &UpperBound::At(day(26)))
        .unwrap()
        .is_none());
}

// ── Terminal deletes ─────────────────────────────────────────────────────

#[test]
fn force_delete_is_terminal_despite_later_records() {
    let mut log = MemoryEventLog::new();
    log.push(Created, "user", 1, json!({"name": "John"}), day(1));
    log.push(ForceDeleted, "user", 1, json!({}), day(2));
    // A capture-layer anomaly: records after the force delete.
    log.push(Updated, "user", 1, json!({"name": "Ghost"}), day(3));
    log.push(Restored, "user", 1, json!({}), day(4));

    let world = blog_world();
    let engine = ReplayEngine::new(&log, &world);

    assert!(engine
        .reconstruct_at("user", &id(1), &UpperBound::At(day(1)))
        .unwrap()
        .is_some());
    for n in 2..=5 {
        assert!(engine
            .reconstruct_at("user", &id(1), &UpperBound::At(day(n)))
            .unwrap()
            .is_none());
    }
}

#[test]
fn delete_on_non_soft_deletable_type_is_terminal() {
    let mut log = MemoryEventLog::new();
    log.push(Created, "category", 1, json!({"name": "News"}), day(1));
    log.push(Updated, "category", 1, json!({"name": "Archive"}), day(2));
    log.push(Deleted, "category", 1, json!({}), day(3));

    let world = blog_world();
    let engine = ReplayEngine::new(&log, &world);

    let category = engine
        .reconstruct_at("category", &id(1), &UpperBound::Version(2))
        .unwrap()
        .unwrap();
    assert_eq!(category.get("name"), Some(&json!("Archive")));

    assert!(engine
        .reconstruct_at("category", &id(1), &UpperBound::Version(3))
        .unwrap()
        .is_none());
    assert!(engine
        .reconstruct_at("category", &id(1), &UpperBound::Version(99))
        .unwrap()
        .is_none());
}

// ── Fold mechanics ───────────────────────────────────────────────────────

#[test]
fn diff_overlays_only_the_fields_it_carries() {
    let mut log = MemoryEventLog::new();
    log.push(
        Created,
        "user",
        1,
        json!({"name": "Jane", "email": "jane@example.net", "phone": "111"}),
        day(1),
    );
    log.push(Updated, "user", 1, json!({"phone": "222"}), day(2));
    log.push(Updated, "user", 1, json!({"email": "jane@example.com"}), day(3));

    let world = blog_world();
    let engine = ReplayEngine::new(&log, &world);

    let jane = engine
        .reconstruct_at("user", &id(1), &UpperBound::At(day(2)))
        .unwrap()
        .unwrap();
    assert_eq!(jane.get("name"), Some(&json!("Jane")));
    assert_eq!(jane.get("email"), Some(&json!("jane@example.net")));
    assert_eq!(jane.get("phone"), Some(&json!("222")));

    let jane = engine
        .reconstruct_at("user", &id(1), &UpperBound::At(day(3)))
        .unwrap()
        .unwrap();
    assert_eq!(jane.get("email"), Some(&json!("jane@example.com")));
    assert_eq!(jane.get("phone"), Some(&json!("222")));
}

#[test]
fn sequence_breaks_ties_within_one_capture_batch() {
    let mut log = MemoryEventLog::new();
    // Same timestamp: the later sequence must win the field.
    log.push(Created, "user", 1, json!({"name": "first"}), day(1));
    log.push(Updated, "user", 1, json!({"name": "second"}), day(1));

    let world = blog_world();
    let engine = ReplayEngine::new(&log, &world);

    let user = engine
        .reconstruct_at("user", &id(1), &UpperBound::At(day(1)))
        .unwrap()
        .unwrap();
    assert_eq!(user.get("name"), Some(&json!("second")));
}

#[test]
fn key_field_is_seeded_on_the_reconstructed_entity() {
    let mut log = MemoryEventLog::new();
    log.push(Created, "user", 42, json!({"name": "John"}), day(1));

    let world = blog_world();
    let engine = ReplayEngine::new(&log, &world);

    let user = engine
        .reconstruct_at("user", &id(42), &UpperBound::At(day(1)))
        .unwrap()
        .unwrap();
    assert_eq!(user.get("id"), Some(&json!(42)));
    assert_eq!(user.entity_id, id(42));
}

// ── Boundaries ───────────────────────────────────────────────────────────

#[test]
fn no_history_reconstructs_to_none() {
    let log = MemoryEventLog::new();
    let world = blog_world();
    let engine = ReplayEngine::new(&log, &world);

    assert!(engine
        .reconstruct_at("user", &id(1), &UpperBound::At(day(1)))
        .unwrap()
        .is_none());
}

#[test]
fn unknown_entity_type_is_a_typed_error() {
    let log = MemoryEventLog::new();
    let world = blog_world();
    let engine = ReplayEngine::new(&log, &world);

    let err = engine
        .reconstruct_at("ghost", &id(1), &UpperBound::At(day(1)))
        .unwrap_err();
    assert!(matches!(
        err,
        HindsightError::Replay(ReplayError::UnknownEntityType { .. })
    ));
}

#[test]
fn reconstruction_is_idempotent_against_an_unchanged_log() {
    let mut log = MemoryEventLog::new();
    log.push(Created, "user", 1, json!({"name": "John"}), day(1));
    log.push(Updated, "user", 1, json!({"phone": "123"}), day(2));
    log.push(Deleted, "user", 1, json!({}), day(3));

    let world = blog_world();
    let engine = ReplayEngine::new(&log, &world);

    let first = engine
        .reconstruct_at("user", &id(1), &UpperBound::At(day(3)))
        .unwrap();
    let second = engine
        .reconstruct_at("user", &id(1), &UpperBound::At(day(3)))
        .unwrap();
    assert_eq!(first, second);
}
