/// Reconstruction subsystem errors.
///
/// Absence of history is not an error — reconstruction returns `None` for
/// it. These variants cover capability mismatches: descriptors the engine
/// cannot honour, and log records it cannot replay.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("unknown entity type: {type_tag}")]
    UnknownEntityType { type_tag: String },

    #[error("unknown relation {relation} on entity type {type_tag}")]
    UnknownRelation { type_tag: String, relation: String },

    #[error("relation {relation} is not reconstructible: {reason}")]
    UnsupportedRelation { relation: String, reason: String },

    #[error("pivot record {sequence} cannot be replayed: {reason}")]
    UnreplayablePivotRecord { sequence: u64, reason: String },
}
