//! HasOne: the single related row under an ordering rule.
//!
//! Only reconstructible when the relation declares exactly one ordering
//! clause and nothing but AND-combined comparison/in/not-in filters.
//! Anything else fails loudly — a silently wrong member would be an
//! undetectable lie about the past.

use hindsight_core::errors::{HindsightResult, ReplayError};
use hindsight_core::models::{
    Direction, Predicate, ReconstructedEntity, RelationDescriptor, RelationResult, UpperBound,
};
use hindsight_core::traits::{IEventStore, ILiveWorld};

use super::filter::{cmp_values, satisfies_all};
use super::{many, related_type};
use crate::engine::ReplayEngine;

pub fn has_one<S: IEventStore, W: ILiveWorld>(
    engine: &ReplayEngine<'_, S, W>,
    parent: &ReconstructedEntity,
    relation: &RelationDescriptor,
    name: &str,
    upper: &UpperBound,
) -> HindsightResult<RelationResult> {
    let related = related_type(relation, name)?;
    check_preconditions(relation, name)?;
    let order = &relation.ordering[0];

    let parent_ids = std::slice::from_ref(&parent.entity_id);
    let mut matches = Vec::new();
    for id in many::candidate_ids(engine, related, &relation.foreign_key, parent_ids)? {
        if let Some(entity) = engine.reconstruct_member(related, &id, upper)? {
            if many::is_member(&entity, relation, parent)
                && satisfies_all(&entity, &relation.predicates)
            {
                matches.push(entity);
            }
        }
    }

    // Extremum under the ordering clause; identity breaks ties, so the
    // pick is deterministic even when order values collide.
    matches.sort_by(|a, b| {
        cmp_values(a.get(&order.field), b.get(&order.field))
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    let picked = match order.direction {
        Direction::Asc => matches.into_iter().next(),
        Direction::Desc => matches.into_iter().next_back(),
    };
    Ok(RelationResult::Single(picked.map(Box::new)))
}

/// The two reconstructibility preconditions, checked before any log access.
fn check_preconditions(relation: &RelationDescriptor, name: &str) -> HindsightResult<()> {
    if relation.ordering.len() != 1 {
        return Err(ReplayError::UnsupportedRelation {
            relation: name.to_string(),
            reason: format!(
                "needs exactly one ordering clause, found {}",
                relation.ordering.len()
            ),
        }
        .into());
    }

    for predicate in &relation.predicates {
        match predicate {
            Predicate::Cmp { .. } | Predicate::In { .. } | Predicate::NotIn { .. } => {}
            Predicate::Raw { sql } => {
                return Err(ReplayError::UnsupportedRelation {
                    relation: name.to_string(),
                    reason: format!("raw predicate cannot be replayed: {sql}"),
                }
                .into());
            }
            Predicate::Or(_) => {
                return Err(ReplayError::UnsupportedRelation {
                    relation: name.to_string(),
                    reason: "predicates must be AND-combined".to_string(),
                }
                .into());
            }
        }
    }
    Ok(())
}
