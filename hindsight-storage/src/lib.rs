//! # hindsight-storage
//!
//! SQLite persistence for the change log. Owns the log schema, the append
//! path used by capture layers, and the read queries behind `IEventStore`.
//! Single connection, WAL mode.

pub mod config;
pub mod log_store;
pub mod migrations;
pub mod queries;

pub use config::StoreConfig;
pub use log_store::SqliteEventLog;

/// Helper to convert a string message into a HindsightError::Store.
pub fn to_store_err(msg: String) -> hindsight_core::HindsightError {
    hindsight_core::HindsightError::Store(hindsight_core::errors::StoreError::SqliteError {
        message: msg,
    })
}
