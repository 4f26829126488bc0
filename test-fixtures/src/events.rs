//! Record builders for scripting histories.

use chrono::{DateTime, Utc};

use hindsight_core::models::{ActionKind, ChangeEvent, Diff, EntityId};

/// A diff payload from a JSON object literal.
pub fn diff(value: serde_json::Value) -> Diff {
    match value {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => Diff::new(),
    }
}

/// A change record with no actor and an unassigned sequence.
pub fn event(
    action: ActionKind,
    entity_type: &str,
    entity_id: impl Into<EntityId>,
    payload: serde_json::Value,
    recorded_at: DateTime<Utc>,
) -> ChangeEvent {
    ChangeEvent {
        sequence: 0,
        entity_type: entity_type.to_string(),
        entity_id: entity_id.into(),
        action,
        diff: diff(payload),
        actor_id: None,
        recorded_at,
    }
}
