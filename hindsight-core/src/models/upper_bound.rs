use chrono::{DateTime, Utc};

use super::ChangeEvent;

/// Upper bound of an as-of query: everything at or before it is replayed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpperBound {
    /// Bound on transaction time: `recorded_at <= t`.
    At(DateTime<Utc>),
    /// Bound on the log sequence: `sequence <= n`.
    Version(u64),
}

impl UpperBound {
    /// Whether a record falls within the bound.
    pub fn admits(&self, event: &ChangeEvent) -> bool {
        match self {
            UpperBound::At(at) => event.recorded_at <= *at,
            UpperBound::Version(n) => event.sequence <= *n,
        }
    }
}

impl From<DateTime<Utc>> for UpperBound {
    fn from(at: DateTime<Utc>) -> Self {
        UpperBound::At(at)
    }
}

impl From<u64> for UpperBound {
    fn from(n: u64) -> Self {
        UpperBound::Version(n)
    }
}
