//! HasManyThrough: two hops, each replayed independently at the bound.

use hindsight_core::errors::HindsightResult;
use hindsight_core::models::{EntityId, ReconstructedEntity, RelationDescriptor, UpperBound};
use hindsight_core::traits::{IEventStore, ILiveWorld};

use super::{many, missing_field, related_type};
use crate::engine::ReplayEngine;

/// parent → intermediate → related.
///
/// Candidates at each hop are the union of currently linked and ever
/// linked, because membership at each hop can have changed independently
/// since the instant. Final membership needs both hops to hold
/// simultaneously at the bound: the intermediate must exist holding the
/// parent's key, and the related must exist holding one of those live
/// intermediates.
pub fn has_many_through<S: IEventStore, W: ILiveWorld>(
    engine: &ReplayEngine<'_, S, W>,
    parent: &ReconstructedEntity,
    relation: &RelationDescriptor,
    name: &str,
    upper: &UpperBound,
) -> HindsightResult<Vec<ReconstructedEntity>> {
    let related = related_type(relation, name)?;
    let through = relation
        .through_type
        .as_deref()
        .ok_or_else(|| missing_field(name, "through_type"))?;
    let through_key = relation
        .through_foreign_key
        .as_deref()
        .ok_or_else(|| missing_field(name, "through_foreign_key"))?;

    let parent_ids = std::slice::from_ref(&parent.entity_id);
    let intermediate_candidates =
        many::candidate_ids(engine, through, &relation.foreign_key, parent_ids)?;

    let mut live_intermediates = Vec::new();
    for id in &intermediate_candidates {
        if let Some(entity) = engine.reconstruct_member(through, id, upper)? {
            let held = entity
                .get(&relation.foreign_key)
                .map(|value| parent.entity_id.matches_value(value))
                .unwrap_or(false);
            if held {
                live_intermediates.push(id.clone());
            }
        }
    }

    if live_intermediates.is_empty() {
        return Ok(Vec::new());
    }

    // Discovery casts the wide net over every candidate intermediate;
    // membership is then checked against the ones alive at the bound.
    let related_candidates =
        many::candidate_ids(engine, related, through_key, &intermediate_candidates)?;

    let mut members = Vec::new();
    for id in related_candidates {
        if let Some(entity) = engine.reconstruct_member(related, &id, upper)? {
            let held = entity
                .get(through_key)
                .and_then(EntityId::from_value)
                .map(|fk| live_intermediates.contains(&fk))
                .unwrap_or(false);
            if held {
                members.push(entity);
            }
        }
    }
    Ok(members)
}
