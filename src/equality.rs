//! Deep, type-aware, total equality over the value domain (spec §4.F).

use crate::value::{OrderedMap, Value};

/// `equals(v1, v2)`. Never errors: every pair of values has a defined
/// equality result, including NaN (which equals nothing, itself included)
/// and cross-type numerics (which compare by mathematical value).
pub fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bytes(a), Value::Bytes(b)) => a == b,
        (Value::Duration(a), Value::Duration(b)) => {
            (a.seconds, a.nanos) == (b.seconds, b.nanos)
        }
        (Value::Timestamp(a), Value::Timestamp(b)) => {
            (a.seconds, a.nanos) == (b.seconds, b.nanos)
        }
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| equals(x, y))
        }
        (Value::Map(a), Value::Map(b)) => maps_equal(a, b),
        (Value::Type(a), Value::Type(b)) => a == b,
        (Value::Optional(a), Value::Optional(b)) => match (a, b) {
            (Some(a), Some(b)) => equals(a, b),
            (None, None) => true,
            _ => false,
        },
        (Value::Message(a), Value::Message(b)) => {
            // Field-wise comparison on set fields is mediated by the
            // `TypeProvider` (spec §4.F); without one in hand here we fall
            // back to identity, matching the teacher's dunder-lookup fast
            // path before it consults a type's `__eq__`.
            std::rc::Rc::ptr_eq(a, b)
        }
        // Numeric: heterogeneous (int, uint, double) by mathematical
        // equality. NaN equals nothing, per spec §4.F and §8.
        (Value::Int(_) | Value::Uint(_) | Value::Double(_), Value::Int(_) | Value::Uint(_) | Value::Double(_)) => {
            matches!(crate::numeric::heterogeneous_cmp(a, b), Some(std::cmp::Ordering::Equal))
        }
        _ => false,
    }
}

/// Two maps are equal iff they have the same key set (by equality) and
/// matching values at each key.
pub fn maps_equal(a: &OrderedMap, b: &OrderedMap) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(k, v)| b.get(k).is_some_and(|bv| equals(v, bv)))
}
