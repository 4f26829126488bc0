use super::{ReplayError, StoreError};

/// Top-level error type for the Hindsight engine.
/// All subsystem errors convert into this via `From` impls.
#[derive(Debug, thiserror::Error)]
pub enum HindsightError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("replay error: {0}")]
    Replay(#[from] ReplayError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias.
pub type HindsightResult<T> = Result<T, HindsightError>;
