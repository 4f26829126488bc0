//! # hindsight-replay
//!
//! Point-in-time reconstruction over an append-only change log.
//! Folds attribute-level diffs into the state an entity had at a past
//! instant, and rebuilds its relation memberships as of that instant —
//! a snapshot read implemented entirely above the storage engine.

pub mod engine;
pub mod merge;
pub mod relations;

pub use engine::ReplayEngine;
