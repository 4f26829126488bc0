//! Store configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the SQLite log store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name of the change-log table.
    pub table: String,
    /// SQLite busy timeout applied on open.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: "change_log".to_string(),
            busy_timeout_ms: 5_000,
        }
    }
}
