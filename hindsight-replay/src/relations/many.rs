//! HasMany / MorphMany: candidates from live state and the log, membership
//! decided by the foreign key's value at the bound.

use hindsight_core::errors::HindsightResult;
use hindsight_core::models::{EntityId, ReconstructedEntity, RelationDescriptor, UpperBound};
use hindsight_core::traits::{DiffMatch, DiffQuery, IEventStore, ILiveWorld};

use super::related_type;
use crate::engine::ReplayEngine;

pub fn has_many<S: IEventStore, W: ILiveWorld>(
    engine: &ReplayEngine<'_, S, W>,
    parent: &ReconstructedEntity,
    relation: &RelationDescriptor,
    name: &str,
    upper: &UpperBound,
) -> HindsightResult<Vec<ReconstructedEntity>> {
    let related = related_type(relation, name)?;
    let parent_ids = std::slice::from_ref(&parent.entity_id);

    let mut members = Vec::new();
    for id in candidate_ids(engine, related, &relation.foreign_key, parent_ids)? {
        if let Some(entity) = engine.reconstruct_member(related, &id, upper)? {
            if is_member(&entity, relation, parent) {
                members.push(entity);
            }
        }
    }
    Ok(members)
}

/// Shared candidate machinery: identities currently holding the key in the
/// live system, unioned with identities that ever held it per the log.
/// Discovery is deliberately broad — membership is decided per candidate
/// by replaying it at the bound. Identity-ascending, deduplicated.
pub(crate) fn candidate_ids<S: IEventStore, W: ILiveWorld>(
    engine: &ReplayEngine<'_, S, W>,
    related: &str,
    foreign_key: &str,
    parents: &[EntityId],
) -> HindsightResult<Vec<EntityId>> {
    if parents.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids = engine
        .world
        .current_related_ids(related, foreign_key, parents)?;

    let query = DiffQuery {
        entity_type: Some(related.to_string()),
        matches: vec![key_match(foreign_key, parents)],
        ..Default::default()
    };
    for event in engine.store.events_matching(&query)? {
        ids.push(event.entity_id.clone());
    }

    ids.sort();
    ids.dedup();
    Ok(ids)
}

pub(crate) fn key_match(field: &str, parents: &[EntityId]) -> DiffMatch {
    match parents {
        [single] => DiffMatch::Eq {
            field: field.to_string(),
            value: single.to_value(),
        },
        _ => DiffMatch::In {
            field: field.to_string(),
            values: parents.iter().map(EntityId::to_value).collect(),
        },
    }
}

/// The key's value at the bound decides membership — the entity may have
/// been reassigned to another parent since the instant, or away before it.
/// Morph kinds additionally pin the parent's type tag, so parents of
/// different types sharing an id value never claim each other's members.
pub(crate) fn is_member(
    entity: &ReconstructedEntity,
    relation: &RelationDescriptor,
    parent: &ReconstructedEntity,
) -> bool {
    let key_matches = entity
        .get(&relation.foreign_key)
        .map(|value| parent.entity_id.matches_value(value))
        .unwrap_or(false);

    let morph_matches = match &relation.morph_type_field {
        None => true,
        Some(field) => {
            entity.get(field).and_then(|value| value.as_str())
                == Some(parent.entity_type.as_str())
        }
    };

    key_matches && morph_matches
}
