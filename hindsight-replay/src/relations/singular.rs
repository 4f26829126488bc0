//! BelongsTo / MorphTo: the related key is already on the parent.

use hindsight_core::errors::HindsightResult;
use hindsight_core::models::{
    EntityId, ReconstructedEntity, RelationDescriptor, RelationResult, UpperBound,
};
use hindsight_core::traits::{IEventStore, ILiveWorld};

use super::{missing_field, related_type};
use crate::engine::ReplayEngine;

pub fn belongs_to<S: IEventStore, W: ILiveWorld>(
    engine: &ReplayEngine<'_, S, W>,
    parent: &ReconstructedEntity,
    relation: &RelationDescriptor,
    name: &str,
    upper: &UpperBound,
) -> HindsightResult<RelationResult> {
    let related = related_type(relation, name)?;
    resolve_key(engine, parent, relation, related, upper)
}

/// The discriminant field on the parent names the related type; the key
/// is resolved the same way from there.
pub fn morph_to<S: IEventStore, W: ILiveWorld>(
    engine: &ReplayEngine<'_, S, W>,
    parent: &ReconstructedEntity,
    relation: &RelationDescriptor,
    name: &str,
    upper: &UpperBound,
) -> HindsightResult<RelationResult> {
    let morph_field = relation
        .morph_type_field
        .as_deref()
        .ok_or_else(|| missing_field(name, "morph_type_field"))?;

    let Some(related) = parent.get(morph_field).and_then(|value| value.as_str()) else {
        return Ok(RelationResult::Single(None));
    };
    let related = related.to_string();

    resolve_key(engine, parent, relation, &related, upper)
}

fn resolve_key<S: IEventStore, W: ILiveWorld>(
    engine: &ReplayEngine<'_, S, W>,
    parent: &ReconstructedEntity,
    relation: &RelationDescriptor,
    related: &str,
    upper: &UpperBound,
) -> HindsightResult<RelationResult> {
    let Some(id) = parent
        .get(&relation.foreign_key)
        .and_then(EntityId::from_value)
    else {
        return Ok(RelationResult::Single(None));
    };

    let target = engine.reconstruct_member(related, &id, upper)?;
    Ok(RelationResult::Single(target.map(Box::new)))
}
