//! v001: the append-only change log.

use rusqlite::Connection;

use hindsight_core::errors::HindsightResult;

use crate::{to_store_err, StoreConfig};

pub fn migrate(conn: &Connection, cfg: &StoreConfig) -> HindsightResult<()> {
    let table = &cfg.table;
    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS {table} (
            sequence    INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_type TEXT NOT NULL,
            entity_id   TEXT NOT NULL,
            action      TEXT NOT NULL,
            diff        TEXT NOT NULL,
            actor_id    TEXT,
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_{table}_entity_time
            ON {table}(entity_type, entity_id, recorded_at);
        CREATE INDEX IF NOT EXISTS idx_{table}_time
            ON {table}(recorded_at);
        CREATE INDEX IF NOT EXISTS idx_{table}_action
            ON {table}(action);
        ",
    ))
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}
