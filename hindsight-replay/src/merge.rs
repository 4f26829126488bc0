//! Diff merge: fold a time-bounded slice of the log into one attribute set.

use hindsight_core::models::{
    format_log_timestamp, ActionKind, ChangeEvent, Diff, EntityDescriptor, EntityId,
};

/// Fold an ordered record slice into the entity's attribute set.
///
/// The slice must already be bounded and ascending by
/// `(recorded_at, sequence)`. Semantics of the fold:
/// - `ForceDeleted` is terminal: the result collapses to `None` and stays
///   there regardless of later records.
/// - Each record's diff overlays the running set, record fields winning.
/// - `Deleted` sets the soft-delete marker to the record's timestamp, or
///   collapses to `None` when the type has no marker — a hard delete
///   cannot be reconstructed past.
/// - `Restored` clears the marker.
///
/// Returns `None` when the slice is empty or the fold collapsed.
pub fn merge_events(
    descriptor: &EntityDescriptor,
    entity_id: &EntityId,
    events: &[ChangeEvent],
) -> Option<Diff> {
    if events.is_empty() {
        return None;
    }

    let mut base = Diff::new();
    base.insert(descriptor.key_field.clone(), entity_id.to_value());

    let mut state = Some(base);
    for event in events {
        state = apply_event(descriptor, state, event);
    }
    state
}

/// Apply one record to the running state.
pub fn apply_event(
    descriptor: &EntityDescriptor,
    state: Option<Diff>,
    event: &ChangeEvent,
) -> Option<Diff> {
    let mut attributes = state?;

    if event.action == ActionKind::ForceDeleted {
        return None;
    }
    // Pivot records concern the join row, never the entity's own columns.
    if event.action.is_pivot() {
        return Some(attributes);
    }

    for (field, value) in &event.diff {
        attributes.insert(field.clone(), value.clone());
    }

    match event.action {
        ActionKind::Deleted => match &descriptor.deleted_at_field {
            Some(marker) => {
                attributes.insert(
                    marker.clone(),
                    serde_json::Value::from(format_log_timestamp(event.recorded_at)),
                );
            }
            None => return None,
        },
        ActionKind::Restored => {
            if let Some(marker) = &descriptor.deleted_at_field {
                attributes.insert(marker.clone(), serde_json::Value::Null);
            }
        }
        _ => {}
    }

    Some(attributes)
}

/// Whether the merged state counts as a live relation member.
///
/// Soft-deleted state keeps its attributes (direct lookups still return
/// it) but is not a member of anything.
pub fn exists(descriptor: &EntityDescriptor, merged: &Option<Diff>) -> bool {
    match merged {
        None => false,
        Some(attributes) => match &descriptor.deleted_at_field {
            None => true,
            Some(marker) => matches!(
                attributes.get(marker),
                None | Some(serde_json::Value::Null)
            ),
        },
    }
}
