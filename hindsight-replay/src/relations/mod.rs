//! Relation reconstruction: one strategy per relation kind.

mod filter;
mod many;
mod ordered_one;
mod pivot;
mod singular;
mod through;

use hindsight_core::errors::{HindsightResult, ReplayError};
use hindsight_core::models::{
    ReconstructedEntity, RelationDescriptor, RelationKind, RelationResult, UpperBound,
};
use hindsight_core::traits::{IEventStore, ILiveWorld};

use crate::engine::ReplayEngine;

/// Rebuild one named relation on an already-reconstructed parent.
///
/// Dispatch is exhaustive over `RelationKind`: a kind without a strategy is
/// a compile error, not a silent fall-through. Unknown relation *names* and
/// type tags fail with typed errors before any log access.
pub fn reconstruct_relation<S: IEventStore, W: ILiveWorld>(
    engine: &ReplayEngine<'_, S, W>,
    parent: &ReconstructedEntity,
    name: &str,
    upper: &UpperBound,
) -> HindsightResult<RelationResult> {
    let descriptor = engine.descriptor(&parent.entity_type)?;
    let relation = descriptor.relations.get(name).ok_or_else(|| {
        ReplayError::UnknownRelation {
            type_tag: parent.entity_type.clone(),
            relation: name.to_string(),
        }
    })?;

    match relation.kind {
        RelationKind::BelongsTo => singular::belongs_to(engine, parent, relation, name, upper),
        RelationKind::MorphTo => singular::morph_to(engine, parent, relation, name, upper),
        RelationKind::HasMany | RelationKind::MorphMany => {
            many::has_many(engine, parent, relation, name, upper).map(RelationResult::Many)
        }
        RelationKind::BelongsToMany | RelationKind::MorphToMany => {
            pivot::belongs_to_many(engine, parent, relation, name, upper).map(RelationResult::Many)
        }
        RelationKind::HasManyThrough => {
            through::has_many_through(engine, parent, relation, name, upper)
                .map(RelationResult::Many)
        }
        RelationKind::HasOne => ordered_one::has_one(engine, parent, relation, name, upper),
    }
}

/// The related type tag, which every kind except MorphTo declares up front.
pub(crate) fn related_type<'r>(
    relation: &'r RelationDescriptor,
    name: &str,
) -> HindsightResult<&'r str> {
    relation
        .related_type
        .as_deref()
        .ok_or_else(|| missing_field(name, "related_type"))
}

/// A descriptor field required by the relation's kind but not supplied.
pub(crate) fn missing_field(name: &str, field: &str) -> hindsight_core::HindsightError {
    ReplayError::UnsupportedRelation {
        relation: name.to_string(),
        reason: format!("descriptor declares no {field}"),
    }
    .into()
}
