//! IEventStore — the narrow read interface onto the change log.

use crate::errors::HindsightResult;
use crate::models::{ActionKind, ChangeEvent, EntityId, UpperBound};

/// One constraint against a record's diff payload.
#[derive(Debug, Clone)]
pub enum DiffMatch {
    /// Field equals the value.
    Eq {
        field: String,
        value: serde_json::Value,
    },
    /// Field equals one of the values.
    In {
        field: String,
        values: Vec<serde_json::Value>,
    },
}

/// Filtered scan of the change log, matched against the diff payload.
#[derive(Debug, Clone, Default)]
pub struct DiffQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<EntityId>,
    pub matches: Vec<DiffMatch>,
    pub actions: Option<Vec<ActionKind>>,
    pub upper: Option<UpperBound>,
}

/// Read side of the append-only change log.
///
/// The engine is a pure consumer: it never writes, caches, or retries
/// through this interface, and any failure propagates immediately.
pub trait IEventStore {
    /// Records for one entity at or before the bound, ascending by
    /// `(recorded_at, sequence)`.
    fn events_for(
        &self,
        entity_type: &str,
        entity_id: &EntityId,
        upper: Option<&UpperBound>,
    ) -> HindsightResult<Vec<ChangeEvent>>;

    /// Records matching diff-payload constraints, ascending by
    /// `(recorded_at, sequence)`.
    fn events_matching(&self, query: &DiffQuery) -> HindsightResult<Vec<ChangeEvent>>;
}
