//! SQLite-backed change log: append path plus the `IEventStore` read side.

use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use hindsight_core::errors::{HindsightResult, StoreError};
use hindsight_core::models::{
    format_log_timestamp, parse_log_timestamp, ActionKind, ChangeEvent, Diff, EntityId, UpperBound,
};
use hindsight_core::traits::{DiffQuery, IEventStore};
use hindsight_core::HindsightError;

use crate::migrations;
use crate::queries::log_ops::{self, RawRecord};
use crate::{to_store_err, StoreConfig};

/// Append-only change log persisted in SQLite.
///
/// One connection, WAL mode. Each append is a single transaction, so an
/// as-of read never observes a partial record even while a capture layer
/// is writing through another handle.
pub struct SqliteEventLog {
    conn: Connection,
    cfg: StoreConfig,
}

impl SqliteEventLog {
    /// Open (and migrate) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> HindsightResult<Self> {
        Self::open_with(path, StoreConfig::default())
    }

    pub fn open_with(path: impl AsRef<Path>, cfg: StoreConfig) -> HindsightResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_store_err(e.to_string()))?;
        Self::setup(conn, cfg)
    }

    /// In-memory store, mostly for tests and examples.
    pub fn open_in_memory() -> HindsightResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_store_err(e.to_string()))?;
        Self::setup(conn, StoreConfig::default())
    }

    fn setup(conn: Connection, cfg: StoreConfig) -> HindsightResult<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| to_store_err(e.to_string()))?;
        conn.pragma_update(None, "busy_timeout", cfg.busy_timeout_ms as i64)
            .map_err(|e| to_store_err(e.to_string()))?;

        migrations::run_migrations(&conn, &cfg)?;
        debug!("opened change log, table {}", cfg.table);
        Ok(Self { conn, cfg })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }

    /// Append one record. The store assigns the next sequence; the value
    /// already in `event.sequence` is ignored.
    pub fn append(&self, event: &ChangeEvent) -> HindsightResult<u64> {
        let diff = serde_json::to_string(&event.diff)?;
        log_ops::insert_record(
            &self.conn,
            &self.cfg,
            &event.entity_type,
            &event.entity_id.as_log_key(),
            event.action.as_str(),
            &diff,
            event.actor_id.as_ref().map(EntityId::as_log_key).as_deref(),
            &format_log_timestamp(event.recorded_at),
        )
    }

    /// Append a batch atomically. Returns the assigned sequences.
    pub fn append_batch(&self, events: &[ChangeEvent]) -> HindsightResult<Vec<u64>> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| to_store_err(e.to_string()))?;

        let mut sequences = Vec::with_capacity(events.len());
        for event in events {
            let diff = serde_json::to_string(&event.diff)?;
            sequences.push(log_ops::insert_record(
                &tx,
                &self.cfg,
                &event.entity_type,
                &event.entity_id.as_log_key(),
                event.action.as_str(),
                &diff,
                event.actor_id.as_ref().map(EntityId::as_log_key).as_deref(),
                &format_log_timestamp(event.recorded_at),
            )?);
        }

        tx.commit().map_err(|e| to_store_err(e.to_string()))?;
        Ok(sequences)
    }

    /// Record count for one entity.
    pub fn count_for(&self, entity_type: &str, entity_id: &EntityId) -> HindsightResult<u64> {
        log_ops::count_for(&self.conn, &self.cfg, entity_type, &entity_id.as_log_key())
    }
}

/// Convert a raw row into a ChangeEvent. A row that fails here is a
/// contract violation by whatever wrote it, reported as such.
fn raw_to_event(raw: RawRecord) -> HindsightResult<ChangeEvent> {
    let action = ActionKind::parse(&raw.action).ok_or_else(|| {
        HindsightError::Store(StoreError::MalformedRecord {
            sequence: raw.sequence,
            reason: format!("unknown action tag '{}'", raw.action),
        })
    })?;

    let diff: Diff = serde_json::from_str(&raw.diff).map_err(|e| {
        HindsightError::Store(StoreError::MalformedRecord {
            sequence: raw.sequence,
            reason: format!("diff payload: {e}"),
        })
    })?;

    let recorded_at = parse_log_timestamp(&raw.recorded_at).ok_or_else(|| {
        HindsightError::Store(StoreError::MalformedRecord {
            sequence: raw.sequence,
            reason: format!("recorded_at '{}' is not RFC3339", raw.recorded_at),
        })
    })?;

    Ok(ChangeEvent {
        sequence: raw.sequence,
        entity_type: raw.entity_type,
        entity_id: EntityId::from_log_key(&raw.entity_id),
        action,
        diff,
        actor_id: raw.actor_id.as_deref().map(EntityId::from_log_key),
        recorded_at,
    })
}

impl IEventStore for SqliteEventLog {
    fn events_for(
        &self,
        entity_type: &str,
        entity_id: &EntityId,
        upper: Option<&UpperBound>,
    ) -> HindsightResult<Vec<ChangeEvent>> {
        let raw = log_ops::records_for_entity(
            &self.conn,
            &self.cfg,
            entity_type,
            &entity_id.as_log_key(),
            upper,
        )?;
        raw.into_iter().map(raw_to_event).collect()
    }

    fn events_matching(&self, query: &DiffQuery) -> HindsightResult<Vec<ChangeEvent>> {
        let raw = log_ops::records_matching(&self.conn, &self.cfg, query)?;
        raw.into_iter().map(raw_to_event).collect()
    }
}
