//! BelongsToMany / MorphToMany: replay of the pivot sub-stream.

use std::collections::BTreeMap;

use hindsight_core::errors::{HindsightResult, ReplayError};
use hindsight_core::models::{
    ActionKind, ChangeEvent, Diff, EntityId, ReconstructedEntity, RelationDescriptor, UpperBound,
    PIVOT_ACTIONS, PIVOT_TABLE_KEY,
};
use hindsight_core::traits::{DiffMatch, DiffQuery, IEventStore, ILiveWorld};

use super::{missing_field, related_type};
use crate::engine::ReplayEngine;

/// Replay attach/detach/update records for the relation's pivot table into
/// the membership as of the bound, then rebuild each surviving member.
///
/// The fold upserts on attach/update and removes on detach, leaving an
/// ordered map from related identity to its latest pivot attribute set.
/// Survivors are reconstructed existence-gated and carry the pivot
/// attributes (diff minus `_pivot*` metadata) in the `pivot` side-channel.
pub fn belongs_to_many<S: IEventStore, W: ILiveWorld>(
    engine: &ReplayEngine<'_, S, W>,
    parent: &ReconstructedEntity,
    relation: &RelationDescriptor,
    name: &str,
    upper: &UpperBound,
) -> HindsightResult<Vec<ReconstructedEntity>> {
    let related = related_type(relation, name)?;
    let pivot_table = relation
        .pivot_table
        .as_deref()
        .ok_or_else(|| missing_field(name, "pivot_table"))?;
    let related_key = relation
        .related_pivot_key
        .as_deref()
        .ok_or_else(|| missing_field(name, "related_pivot_key"))?;

    let events = pivot_stream(engine, parent, relation, related, pivot_table, upper)?;

    let mut membership: BTreeMap<EntityId, Diff> = BTreeMap::new();
    for event in &events {
        // Polymorphic pivots carry the parent-side discriminant; rows for
        // parents of another type are not part of this relation.
        if let Some(morph_field) = &relation.morph_type_field {
            if event.diff.get(morph_field).and_then(|v| v.as_str())
                != Some(parent.entity_type.as_str())
            {
                continue;
            }
        }

        // A pivot record with no related-side key cannot be replayed
        // per-identity. This happens when a bulk detach-all is captured as
        // one event — a capture-layer gap, rejected rather than guessed at.
        let related_id = event
            .diff
            .get(related_key)
            .and_then(EntityId::from_value)
            .ok_or_else(|| ReplayError::UnreplayablePivotRecord {
                sequence: event.sequence,
                reason: format!("no {related_key} in pivot payload"),
            })?;

        match event.action {
            ActionKind::PivotDetached => {
                membership.remove(&related_id);
            }
            _ => {
                membership.insert(related_id, event.pivot_attributes());
            }
        }
    }

    let mut members = Vec::with_capacity(membership.len());
    for (id, pivot) in membership {
        if let Some(mut entity) = engine.reconstruct_member(related, &id, upper)? {
            entity.pivot = Some(pivot);
            members.push(entity);
        }
    }
    Ok(members)
}

/// Time-bounded pivot records from both emission paths, merged into one
/// ascending `(recorded_at, sequence)` stream.
///
/// An attach may have been captured against the parent itself, or against
/// the related type carrying the parent's key in its pivot payload —
/// whichever side initiated the write. Both scopes are required.
fn pivot_stream<S: IEventStore, W: ILiveWorld>(
    engine: &ReplayEngine<'_, S, W>,
    parent: &ReconstructedEntity,
    relation: &RelationDescriptor,
    related: &str,
    pivot_table: &str,
    upper: &UpperBound,
) -> HindsightResult<Vec<ChangeEvent>> {
    let table_match = DiffMatch::Eq {
        field: PIVOT_TABLE_KEY.to_string(),
        value: serde_json::Value::from(pivot_table),
    };

    let own = DiffQuery {
        entity_type: Some(parent.entity_type.clone()),
        entity_id: Some(parent.entity_id.clone()),
        matches: vec![table_match.clone()],
        actions: Some(PIVOT_ACTIONS.to_vec()),
        upper: Some(*upper),
    };

    let mut reverse_matches = vec![
        table_match,
        DiffMatch::Eq {
            field: relation.foreign_key.clone(),
            value: parent.entity_id.to_value(),
        },
    ];
    if let Some(morph_field) = &relation.morph_type_field {
        reverse_matches.push(DiffMatch::Eq {
            field: morph_field.clone(),
            value: serde_json::Value::from(parent.entity_type.as_str()),
        });
    }
    let reverse = DiffQuery {
        entity_type: Some(related.to_string()),
        entity_id: None,
        matches: reverse_matches,
        actions: Some(PIVOT_ACTIONS.to_vec()),
        upper: Some(*upper),
    };

    let mut events = engine.store.events_matching(&own)?;
    events.extend(engine.store.events_matching(&reverse)?);
    events.sort_by(|a, b| (a.recorded_at, a.sequence).cmp(&(b.recorded_at, b.sequence)));
    events.dedup_by_key(|event| event.sequence);
    Ok(events)
}
