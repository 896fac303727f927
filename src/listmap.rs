//! List/map runtime primitives (spec §4.E).

use crate::{
    error::{EvalError, EvalResult},
    value::{MapKey, OrderedMap, Value},
};

/// Immutable concatenation of two lists.
pub fn concat_list(a: &[Value], b: &[Value]) -> Vec<Value> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

/// List indexing with an int64 key; negative or out-of-range raises
/// `index_out_of_bounds`.
pub fn list_index(list: &[Value], index: i64) -> EvalResult<Value> {
    if index < 0 || index as usize >= list.len() {
        return Err(EvalError::index_out_of_bounds(index, list.len()));
    }
    Ok(list[index as usize].clone())
}

/// Converts a runtime value into a map key, if it is one of the types CEL
/// allows as a key (bool, int, uint, string).
pub fn value_to_map_key(v: &Value) -> EvalResult<MapKey> {
    match v {
        Value::Bool(b) => Ok(MapKey::Bool(*b)),
        Value::Int(i) => Ok(MapKey::Int(*i)),
        Value::Uint(u) => Ok(MapKey::Uint(*u)),
        Value::String(s) => Ok(MapKey::String(s.clone())),
        other => Err(EvalError::invalid_argument(format!("unsupported map key type: {}", other.type_value()))),
    }
}

/// Map indexing; a missing key is `attribute_not_found`, matching the spec's
/// `has`/`find` convention. Int/uint keys that compare equal address the
/// same entry because `OrderedMap` normalizes its keys (spec §4.E).
pub fn map_index(map: &OrderedMap, key: &Value) -> EvalResult<Value> {
    let key = value_to_map_key(key)?;
    map.get(&key).cloned().ok_or_else(|| EvalError::attribute_not_found(format!("no such key: {key:?}", key = key)))
}
