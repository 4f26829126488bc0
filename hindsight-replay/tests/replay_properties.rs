//! Property tests: idempotence, prefix-fold consistency, terminal force
//! delete.

use proptest::prelude::*;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use hindsight_core::models::{ActionKind, EntityId, UpperBound};
use hindsight_core::traits::{IEventStore, ILiveWorld};
use hindsight_replay::{merge, ReplayEngine};
use test_fixtures::{blog_world, MemoryEventLog};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()
}

/// Scripted history: create, then n steps of phone updates interleaved
/// with delete/restore pairs.
fn scripted_log(n: usize) -> MemoryEventLog {
    let mut log = MemoryEventLog::new();
    let t0 = base_time();
    log.push(
        ActionKind::Created,
        "user",
        1,
        json!({"name": "prop", "phone": "0"}),
        t0,
    );
    for i in 0..n {
        let at = t0 + Duration::hours((i + 1) as i64);
        match i % 5 {
            3 => {
                log.push(ActionKind::Deleted, "user", 1, json!({}), at);
            }
            4 => {
                log.push(ActionKind::Restored, "user", 1, json!({}), at);
            }
            _ => {
                log.push(
                    ActionKind::Updated,
                    "user",
                    1,
                    json!({"phone": i.to_string()}),
                    at,
                );
            }
        }
    }
    log
}

proptest! {
    #[test]
    fn prop_reconstruction_is_idempotent(n in 1usize..40) {
        let log = scripted_log(n);
        let world = blog_world();
        let engine = ReplayEngine::new(&log, &world);
        let bound = UpperBound::Version((n as u64) + 1);

        let first = engine.reconstruct_at("user", &EntityId::Int(1), &bound).unwrap();
        let second = engine.reconstruct_at("user", &EntityId::Int(1), &bound).unwrap();
        prop_assert_eq!(first, second);
    }
}

proptest! {
    // The state at an earlier bound, folded forward over the remaining
    // records, must equal the state at the later bound.
    #[test]
    fn prop_earlier_state_is_a_prefix_fold_of_later_state(n in 2usize..40, split in 1u64..40) {
        let log = scripted_log(n);
        let total = (n as u64) + 1;
        let split = split.min(total);
        let world = blog_world();
        let engine = ReplayEngine::new(&log, &world);
        let descriptor = world.entity("user").unwrap();

        let mut folded = engine
            .reconstruct_at("user", &EntityId::Int(1), &UpperBound::Version(split))
            .unwrap()
            .map(|entity| entity.attributes);

        let events = log.events_for("user", &EntityId::Int(1), None).unwrap();
        for event in events.iter().filter(|event| event.sequence > split) {
            folded = merge::apply_event(descriptor, folded, event);
        }

        let full = engine
            .reconstruct_at("user", &EntityId::Int(1), &UpperBound::Version(total))
            .unwrap()
            .map(|entity| entity.attributes);
        prop_assert_eq!(folded, full);
    }
}

proptest! {
    #[test]
    fn prop_force_delete_is_terminal(n in 1usize..30, later in 0usize..10) {
        let mut log = scripted_log(n);
        let t = base_time() + Duration::hours((n + 1) as i64);
        log.push(ActionKind::ForceDeleted, "user", 1, json!({}), t);
        for j in 0..later {
            log.push(
                ActionKind::Updated,
                "user",
                1,
                json!({"phone": "zombie"}),
                t + Duration::hours((j + 1) as i64),
            );
        }

        let world = blog_world();
        let engine = ReplayEngine::new(&log, &world);

        let force_delete_seq = (n as u64) + 2;
        prop_assert!(engine
            .reconstruct_at("user", &EntityId::Int(1), &UpperBound::Version(force_delete_seq - 1))
            .unwrap()
            .is_some());
        for bound in force_delete_seq..=(force_delete_seq + later as u64) {
            prop_assert!(engine
                .reconstruct_at("user", &EntityId::Int(1), &UpperBound::Version(bound))
                .unwrap()
                .is_none());
        }
    }
}
