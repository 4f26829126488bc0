//! Raw SQL operations for the change-log table.

use rusqlite::types::ToSql;
use rusqlite::{params, Connection};

use hindsight_core::errors::HindsightResult;
use hindsight_core::models::{format_log_timestamp, UpperBound};
use hindsight_core::traits::{DiffMatch, DiffQuery};

use crate::{to_store_err, StoreConfig};

/// Raw log row, exactly as stored.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub sequence: u64,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub diff: String,
    pub actor_id: Option<String>,
    pub recorded_at: String,
}

const COLUMNS: &str = "sequence, entity_type, entity_id, action, diff, actor_id, recorded_at";

/// Insert a single record. Returns the assigned sequence.
pub fn insert_record(
    conn: &Connection,
    cfg: &StoreConfig,
    entity_type: &str,
    entity_id: &str,
    action: &str,
    diff: &str,
    actor_id: Option<&str>,
    recorded_at: &str,
) -> HindsightResult<u64> {
    conn.execute(
        &format!(
            "INSERT INTO {} (entity_type, entity_id, action, diff, actor_id, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            cfg.table
        ),
        params![entity_type, entity_id, action, diff, actor_id, recorded_at],
    )
    .map_err(|e| to_store_err(e.to_string()))?;

    Ok(conn.last_insert_rowid() as u64)
}

/// Records for one entity, optionally bounded, ascending by
/// `(recorded_at, sequence)`.
pub fn records_for_entity(
    conn: &Connection,
    cfg: &StoreConfig,
    entity_type: &str,
    entity_id: &str,
    upper: Option<&UpperBound>,
) -> HindsightResult<Vec<RawRecord>> {
    let mut wheres = vec!["entity_type = ?".to_string(), "entity_id = ?".to_string()];
    let mut binds: Vec<Box<dyn ToSql>> = vec![
        Box::new(entity_type.to_string()),
        Box::new(entity_id.to_string()),
    ];
    push_upper(upper, &mut wheres, &mut binds);

    select_records(conn, cfg, &wheres, &binds)
}

/// Records matching diff-payload constraints, ascending by
/// `(recorded_at, sequence)`.
pub fn records_matching(
    conn: &Connection,
    cfg: &StoreConfig,
    query: &DiffQuery,
) -> HindsightResult<Vec<RawRecord>> {
    let mut wheres = Vec::new();
    let mut binds: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(entity_type) = &query.entity_type {
        wheres.push("entity_type = ?".to_string());
        binds.push(Box::new(entity_type.clone()));
    }
    if let Some(entity_id) = &query.entity_id {
        wheres.push("entity_id = ?".to_string());
        binds.push(Box::new(entity_id.as_log_key()));
    }

    for constraint in &query.matches {
        match constraint {
            DiffMatch::Eq { field, value } => {
                wheres.push(format!("json_extract(diff, {}) = ?", json_path(field)));
                binds.push(to_sql_value(value));
            }
            DiffMatch::In { field, values } => {
                if values.is_empty() {
                    wheres.push("1 = 0".to_string());
                    continue;
                }
                let marks = vec!["?"; values.len()].join(", ");
                wheres.push(format!(
                    "json_extract(diff, {}) IN ({marks})",
                    json_path(field)
                ));
                for value in values {
                    binds.push(to_sql_value(value));
                }
            }
        }
    }

    if let Some(actions) = &query.actions {
        let marks = vec!["?"; actions.len()].join(", ");
        wheres.push(format!("action IN ({marks})"));
        for action in actions {
            binds.push(Box::new(action.as_str().to_string()));
        }
    }

    push_upper(query.upper.as_ref(), &mut wheres, &mut binds);

    if wheres.is_empty() {
        wheres.push("1 = 1".to_string());
    }

    select_records(conn, cfg, &wheres, &binds)
}

/// Record count for one entity.
pub fn count_for(
    conn: &Connection,
    cfg: &StoreConfig,
    entity_type: &str,
    entity_id: &str,
) -> HindsightResult<u64> {
    conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE entity_type = ?1 AND entity_id = ?2",
            cfg.table
        ),
        params![entity_type, entity_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|count| count as u64)
    .map_err(|e| to_store_err(e.to_string()))
}

fn push_upper(
    upper: Option<&UpperBound>,
    wheres: &mut Vec<String>,
    binds: &mut Vec<Box<dyn ToSql>>,
) {
    match upper {
        Some(UpperBound::At(at)) => {
            wheres.push("recorded_at <= ?".to_string());
            binds.push(Box::new(format_log_timestamp(*at)));
        }
        Some(UpperBound::Version(n)) => {
            wheres.push("sequence <= ?".to_string());
            binds.push(Box::new(*n as i64));
        }
        None => {}
    }
}

fn select_records(
    conn: &Connection,
    cfg: &StoreConfig,
    wheres: &[String],
    binds: &[Box<dyn ToSql>],
) -> HindsightResult<Vec<RawRecord>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM {} WHERE {} ORDER BY recorded_at ASC, sequence ASC",
        cfg.table,
        wheres.join(" AND ")
    );

    let mut stmt = conn.prepare(&sql).map_err(|e| to_store_err(e.to_string()))?;
    let bind_refs: Vec<&dyn ToSql> = binds.iter().map(|b| b.as_ref()).collect();

    let rows = stmt
        .query_map(bind_refs.as_slice(), row_to_record)
        .map_err(|e| to_store_err(e.to_string()))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_store_err(e.to_string()))
}

/// JSON path literal for a diff field, e.g. `'$."user_id"'`.
fn json_path(field: &str) -> String {
    format!("'$.\"{field}\"'")
}

/// Bind a diff value the way SQLite's json_extract surfaces it: booleans
/// as integers, numbers with numeric affinity, strings as text.
fn to_sql_value(value: &serde_json::Value) -> Box<dyn ToSql> {
    match value {
        serde_json::Value::Null => Box::new(rusqlite::types::Null),
        serde_json::Value::Bool(b) => Box::new(*b as i64),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Box::new(i),
            None => Box::new(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Box::new(s.clone()),
        other => Box::new(other.to_string()),
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> Result<RawRecord, rusqlite::Error> {
    Ok(RawRecord {
        sequence: row.get::<_, i64>(0)? as u64,
        entity_type: row.get(1)?,
        entity_id: row.get(2)?,
        action: row.get(3)?,
        diff: row.get(4)?,
        actor_id: row.get(5)?,
        recorded_at: row.get(6)?,
    })
}
