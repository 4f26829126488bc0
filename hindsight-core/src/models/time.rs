//! Timestamp formatting for the log's `recorded_at` column.

use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width RFC3339 UTC with microseconds, so the stored text column
/// compares lexicographically in time order.
pub fn format_log_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_log_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .ok()
}
