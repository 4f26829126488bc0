//! Migration runner — version tracking, forward-only, transactional per
//! migration.

mod v001_change_log;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use hindsight_core::errors::{HindsightResult, StoreError};
use hindsight_core::HindsightError;

use crate::{to_store_err, StoreConfig};

/// Latest schema version.
pub const LATEST_VERSION: u32 = 1;

type MigrationFn = fn(&Connection, &StoreConfig) -> HindsightResult<()>;

const MIGRATIONS: [(u32, &str, MigrationFn); 1] = [(1, "change_log", v001_change_log::migrate)];

/// Get the current schema version from the database.
/// Returns 0 if the schema_version table doesn't exist yet.
pub fn current_version(conn: &Connection) -> HindsightResult<u32> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version'")
        .and_then(|mut stmt| stmt.exists([]))
        .map_err(|e| to_store_err(e.to_string()))?;

    if !exists {
        return Ok(0);
    }

    let version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .map_err(|e| to_store_err(e.to_string()))?;

    Ok(version)
}

/// Run all pending migrations. Forward-only, each wrapped in a transaction.
pub fn run_migrations(conn: &Connection, cfg: &StoreConfig) -> HindsightResult<u32> {
    let current = current_version(conn)?;
    let mut applied = 0;

    if current >= LATEST_VERSION {
        debug!("change-log schema is up to date (v{current})");
        return Ok(0);
    }

    info!("running migrations: v{current} → v{LATEST_VERSION}");

    for &(version, name, migrate_fn) in &MIGRATIONS {
        if version <= current {
            continue;
        }

        debug!("applying migration v{version:03}: {name}");

        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| to_store_err(format!("begin transaction for v{version:03}: {e}")))?;

        match migrate_fn(conn, cfg) {
            Ok(()) => {
                conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
                    .map_err(|e| to_store_err(format!("record version v{version:03}: {e}")))?;

                conn.execute_batch("COMMIT")
                    .map_err(|e| to_store_err(format!("commit v{version:03}: {e}")))?;

                info!("applied migration v{version:03}: {name}");
                applied += 1;
            }
            Err(e) => {
                warn!("migration v{version:03} failed: {e}, rolling back");
                let _ = conn.execute_batch("ROLLBACK");
                return Err(HindsightError::Store(StoreError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                }));
            }
        }
    }

    info!("applied {applied} migration(s), now at v{LATEST_VERSION}");
    Ok(applied)
}
