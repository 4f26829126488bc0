use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a logged entity.
///
/// Live systems key rows by integer or string (uuid) primary keys; both
/// appear in the log. Ordering is "identity ascending": integers
/// numerically, then strings lexicographically — the deterministic order
/// every collection result uses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl EntityId {
    /// Canonical text form, as stored in the log's `entity_id` column.
    pub fn as_log_key(&self) -> String {
        match self {
            EntityId::Int(n) => n.to_string(),
            EntityId::Str(s) => s.clone(),
        }
    }

    /// Parse the canonical text form back. All-digit keys become `Int`,
    /// matching the capture layer's key normalization.
    pub fn from_log_key(raw: &str) -> Self {
        raw.parse::<i64>()
            .map(EntityId::Int)
            .unwrap_or_else(|_| EntityId::Str(raw.to_string()))
    }

    /// Read an identity out of a diff value. Numeric strings collapse to
    /// `Int` the same way the capture layer normalizes `*_id` payload keys.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(EntityId::Int),
            serde_json::Value::String(s) => Some(Self::from_log_key(s)),
            _ => None,
        }
    }

    /// The identity as a diff value, for building store queries.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            EntityId::Int(n) => serde_json::Value::from(*n),
            EntityId::Str(s) => serde_json::Value::from(s.as_str()),
        }
    }

    /// Whether a foreign-key value read off a reconstructed attribute set
    /// refers to this identity.
    pub fn matches_value(&self, value: &serde_json::Value) -> bool {
        EntityId::from_value(value).as_ref() == Some(self)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "{n}"),
            EntityId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Int(n)
    }
}

impl From<i32> for EntityId {
    fn from(n: i32) -> Self {
        EntityId::Int(n.into())
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Str(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::Str(s)
    }
}
