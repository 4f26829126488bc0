//! Change-log record types: ChangeEvent, ActionKind, the diff payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityId;

/// Field-level diff payload carried by one record: changed fields only,
/// never full state.
pub type Diff = BTreeMap<String, serde_json::Value>;

/// Keys with this prefix in a pivot diff are capture-layer metadata
/// (pivot table, morph discriminant), not entity columns.
pub const PIVOT_KEY_PREFIX: &str = "_pivot";

/// Synthetic diff key naming the pivot table a pivot record belongs to.
pub const PIVOT_TABLE_KEY: &str = "_pivot_table";

/// The atomic unit of the change log. The capture layer writes exactly one
/// record per entity mutation; records are immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Monotonically increasing log sequence; the tie-break when several
    /// records in one capture batch share a timestamp.
    pub sequence: u64,
    /// Morph class of the affected entity.
    pub entity_type: String,
    pub entity_id: EntityId,
    pub action: ActionKind,
    pub diff: Diff,
    /// Who caused the mutation, when the capture layer resolved one.
    pub actor_id: Option<EntityId>,
    /// Transaction time — the primary time axis for as-of queries.
    pub recorded_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Pivot attribute set: the diff minus capture-layer metadata keys.
    pub fn pivot_attributes(&self) -> Diff {
        self.diff
            .iter()
            .filter(|(key, _)| !key.starts_with(PIVOT_KEY_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// The closed set of mutations the capture layer records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Created,
    Updated,
    Deleted,
    Restored,
    ForceDeleted,
    PivotAttached,
    PivotDetached,
    PivotUpdated,
}

/// Actions recorded against pivot rows rather than the entity itself.
pub const PIVOT_ACTIONS: [ActionKind; 3] = [
    ActionKind::PivotAttached,
    ActionKind::PivotDetached,
    ActionKind::PivotUpdated,
];

impl ActionKind {
    pub fn is_pivot(self) -> bool {
        matches!(
            self,
            ActionKind::PivotAttached | ActionKind::PivotDetached | ActionKind::PivotUpdated
        )
    }

    /// Tag as stored in the log's `action` column.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Created => "created",
            ActionKind::Updated => "updated",
            ActionKind::Deleted => "deleted",
            ActionKind::Restored => "restored",
            ActionKind::ForceDeleted => "force_deleted",
            ActionKind::PivotAttached => "pivot_attached",
            ActionKind::PivotDetached => "pivot_detached",
            ActionKind::PivotUpdated => "pivot_updated",
        }
    }

    /// Parse a stored tag. `None` for tags outside the closed set.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "created" => Some(ActionKind::Created),
            "updated" => Some(ActionKind::Updated),
            "deleted" => Some(ActionKind::Deleted),
            "restored" => Some(ActionKind::Restored),
            "force_deleted" => Some(ActionKind::ForceDeleted),
            "pivot_attached" => Some(ActionKind::PivotAttached),
            "pivot_detached" => Some(ActionKind::PivotDetached),
            "pivot_updated" => Some(ActionKind::PivotUpdated),
            _ => None,
        }
    }
}
