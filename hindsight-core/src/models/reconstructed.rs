use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Diff, EntityId};

/// A relation reconstructed alongside its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationResult {
    Single(Option<Box<ReconstructedEntity>>),
    Many(Vec<ReconstructedEntity>),
}

/// Result of replaying an entity's history up to a bound.
///
/// Purely a query result, owned by the caller — never written back to the
/// live system, never cached across calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructedEntity {
    pub entity_type: String,
    pub entity_id: EntityId,
    /// Merged attribute set at the bound, key field included.
    pub attributes: Diff,
    /// False when the soft-delete marker was set at the bound. Soft-deleted
    /// state is returned by direct lookup but never counts as a relation
    /// member.
    pub exists: bool,
    /// Pivot attributes, populated when reached through a many-to-many
    /// relation.
    pub pivot: Option<Diff>,
    /// Relations populated by `reconstruct_with_relations`.
    pub relations: BTreeMap<String, RelationResult>,
}

impl ReconstructedEntity {
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.attributes.get(field)
    }

    /// Whether the soft-delete marker was set at the bound.
    pub fn trashed(&self) -> bool {
        !self.exists
    }

    pub fn relation(&self, name: &str) -> Option<&RelationResult> {
        self.relations.get(name)
    }
}
