//! ILiveWorld — the live system's view of the entity graph.

use crate::errors::HindsightResult;
use crate::models::{EntityDescriptor, EntityId};

/// Descriptor tables plus the current-membership snapshot the engine uses
/// as one half of the "ever related" candidate union.
pub trait ILiveWorld {
    /// Descriptor for a type tag. `None` for tags the live system doesn't
    /// know.
    fn entity(&self, type_tag: &str) -> Option<&EntityDescriptor>;

    /// Identities whose `foreign_key` currently holds one of `parents`,
    /// straight from the live data — not reconstructed from the log.
    fn current_related_ids(
        &self,
        entity_type: &str,
        foreign_key: &str,
        parents: &[EntityId],
    ) -> HindsightResult<Vec<EntityId>>;
}
