//! In-memory `IEventStore` over a plain Vec.

use chrono::{DateTime, Utc};

use hindsight_core::errors::HindsightResult;
use hindsight_core::models::{ActionKind, ChangeEvent, EntityId, UpperBound};
use hindsight_core::traits::{DiffMatch, DiffQuery, IEventStore};

use crate::events;

/// An append-only change log held in memory, with the same matching
/// semantics as the SQLite store.
#[derive(Debug)]
pub struct MemoryEventLog {
    records: Vec<ChangeEvent>,
    next_sequence: u64,
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_sequence: 1,
        }
    }

    /// Append a scripted record. Assigns the next sequence and returns it.
    pub fn push(
        &mut self,
        action: ActionKind,
        entity_type: &str,
        entity_id: impl Into<EntityId>,
        payload: serde_json::Value,
        recorded_at: DateTime<Utc>,
    ) -> u64 {
        self.push_event(events::event(
            action,
            entity_type,
            entity_id,
            payload,
            recorded_at,
        ))
    }

    /// Append a pre-built record, assigning the next sequence.
    pub fn push_event(&mut self, mut event: ChangeEvent) -> u64 {
        event.sequence = self.next_sequence;
        self.next_sequence += 1;
        let sequence = event.sequence;
        self.records.push(event);
        sequence
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Diff value equality the way SQLite's `json_extract` comparison behaves:
/// numbers match numerically across integer/float forms, null never
/// matches anything.
fn value_eq(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    use serde_json::Value;
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().unwrap_or(f64::NAN) == y.as_f64().unwrap_or(f64::NAN)
        }
        _ => a == b,
    }
}

fn matches(event: &ChangeEvent, constraint: &DiffMatch) -> bool {
    match constraint {
        DiffMatch::Eq { field, value } => event
            .diff
            .get(field)
            .map(|v| value_eq(v, value))
            .unwrap_or(false),
        DiffMatch::In { field, values } => event
            .diff
            .get(field)
            .map(|v| values.iter().any(|value| value_eq(v, value)))
            .unwrap_or(false),
    }
}

fn sorted(mut events: Vec<ChangeEvent>) -> Vec<ChangeEvent> {
    events.sort_by(|a, b| (a.recorded_at, a.sequence).cmp(&(b.recorded_at, b.sequence)));
    events
}

impl IEventStore for MemoryEventLog {
    fn events_for(
        &self,
        entity_type: &str,
        entity_id: &EntityId,
        upper: Option<&UpperBound>,
    ) -> HindsightResult<Vec<ChangeEvent>> {
        let events = self
            .records
            .iter()
            .filter(|event| event.entity_type == entity_type && event.entity_id == *entity_id)
            .filter(|event| upper.map(|bound| bound.admits(event)).unwrap_or(true))
            .cloned()
            .collect();
        Ok(sorted(events))
    }

    fn events_matching(&self, query: &DiffQuery) -> HindsightResult<Vec<ChangeEvent>> {
        let events = self
            .records
            .iter()
            .filter(|event| {
                query
                    .entity_type
                    .as_deref()
                    .map(|tag| event.entity_type == tag)
                    .unwrap_or(true)
            })
            .filter(|event| {
                query
                    .entity_id
                    .as_ref()
                    .map(|id| event.entity_id == *id)
                    .unwrap_or(true)
            })
            .filter(|event| query.matches.iter().all(|constraint| matches(event, constraint)))
            .filter(|event| {
                query
                    .actions
                    .as_ref()
                    .map(|actions| actions.contains(&event.action))
                    .unwrap_or(true)
            })
            .filter(|event| {
                query
                    .upper
                    .as_ref()
                    .map(|bound| bound.admits(event))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        Ok(sorted(events))
    }
}
