//! Predicate evaluation against reconstructed attributes.

use std::cmp::Ordering;

use hindsight_core::models::{CmpOp, Predicate, ReconstructedEntity};

/// Total order over diff values: null < bool < number < string < array <
/// object. Numbers compare numerically across integer/float forms; a
/// missing field compares as null.
pub(crate) fn cmp_values(a: Option<&serde_json::Value>, b: Option<&serde_json::Value>) -> Ordering {
    use serde_json::Value;

    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xi, yi) in x.iter().zip(y.iter()) {
                match cmp_values(Some(xi), Some(yi)) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(value: &serde_json::Value) -> u8 {
    use serde_json::Value;
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

pub(crate) fn satisfies_all(entity: &ReconstructedEntity, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|predicate| satisfies(entity, predicate))
}

fn satisfies(entity: &ReconstructedEntity, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Cmp { field, op, value } => {
            let ord = cmp_values(entity.get(field), Some(value));
            match op {
                CmpOp::Eq => ord == Ordering::Equal,
                CmpOp::Ne => ord != Ordering::Equal,
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::Le => ord != Ordering::Greater,
                CmpOp::Gt => ord == Ordering::Greater,
                CmpOp::Ge => ord != Ordering::Less,
            }
        }
        Predicate::In { field, values } => values
            .iter()
            .any(|value| cmp_values(entity.get(field), Some(value)) == Ordering::Equal),
        Predicate::NotIn { field, values } => values
            .iter()
            .all(|value| cmp_values(entity.get(field), Some(value)) != Ordering::Equal),
        // Rejected by the HasOne preconditions; unreachable in practice.
        Predicate::Raw { .. } | Predicate::Or(_) => false,
    }
}
