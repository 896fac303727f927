//! The runtime value domain (spec §3).
//!
//! Unlike the teacher crate's `Value`, which is a hybrid immediate/heap-arena
//! enum backing a mutable, potentially cyclic Python object graph, CEL values
//! are immutable and acyclic for the lifetime of a single evaluation. That
//! lets this enum use plain `Rc` for the heap-shaped variants (spec §9
//! design notes) instead of an arena + interner: no GC, no drop bookkeeping,
//! still one clone away from being shared.

use std::{cmp::Ordering, fmt, rc::Rc};

use crate::{attribute::Attribute, error::EvalError, unknown::UnknownSet};

/// A duration, stored the way protobuf's `google.protobuf.Duration` does:
/// signed seconds plus nanoseconds in `[-999_999_999, 999_999_999]`, both
/// sharing the sign of the overall duration (or zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration {
    pub seconds: i64,
    pub nanos: i32,
}

/// A point in time, stored the way protobuf's `google.protobuf.Timestamp`
/// does: signed seconds since the Unix epoch plus non-negative nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

/// A first-class type value, as returned by the `type(x)` operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeValue {
    Null,
    Bool,
    Int,
    Uint,
    Double,
    String,
    Bytes,
    Duration,
    Timestamp,
    List,
    Map,
    Type,
    Optional,
    Message(Rc<str>),
}

impl fmt::Display for TypeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeValue::Null => write!(f, "null_type"),
            TypeValue::Bool => write!(f, "bool"),
            TypeValue::Int => write!(f, "int"),
            TypeValue::Uint => write!(f, "uint"),
            TypeValue::Double => write!(f, "double"),
            TypeValue::String => write!(f, "string"),
            TypeValue::Bytes => write!(f, "bytes"),
            TypeValue::Duration => write!(f, "google.protobuf.Duration"),
            TypeValue::Timestamp => write!(f, "google.protobuf.Timestamp"),
            TypeValue::List => write!(f, "list"),
            TypeValue::Map => write!(f, "map"),
            TypeValue::Type => write!(f, "type"),
            TypeValue::Optional => write!(f, "optional_type"),
            TypeValue::Message(name) => write!(f, "{name}"),
        }
    }
}

/// A map key, restricted to the types CEL allows as keys (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(Rc<str>),
}

/// An insertion-ordered map from [`MapKey`] to [`Value`].
///
/// Int/uint keys that compare equal under CEL's heterogeneous numeric rule
/// (spec §4.E, e.g. `1` and `1u`) must address the same entry; a plain
/// `IndexMap<MapKey, Value>` would treat them as distinct because `MapKey`'s
/// derived `Hash`/`Eq` are type-aware. `OrderedMap` normalizes int/uint keys
/// into a shared representation before hashing so lookups agree with
/// `equals()`.
#[derive(Debug, Clone, Default)]
pub struct OrderedMap {
    entries: indexmap::IndexMap<NormalizedKey, (MapKey, Value)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NormalizedKey {
    Bool(bool),
    Integral(i128),
    String(Rc<str>),
}

fn normalize_key(key: &MapKey) -> NormalizedKey {
    match key {
        MapKey::Bool(b) => NormalizedKey::Bool(*b),
        MapKey::Int(i) => NormalizedKey::Integral(i128::from(*i)),
        MapKey::Uint(u) => NormalizedKey::Integral(i128::from(*u)),
        MapKey::String(s) => NormalizedKey::String(s.clone()),
    }
}

impl OrderedMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `key -> value`, returning the previous value if the
    /// normalized key was already present (used to detect duplicate map
    /// literal keys under `error_on_duplicate_map_keys`).
    pub fn insert(&mut self, key: MapKey, value: Value) -> Option<Value> {
        self.entries.insert(normalize_key(&key), (key, value)).map(|(_, v)| v)
    }

    pub fn get(&self, key: &MapKey) -> Option<&Value> {
        self.entries.get(&normalize_key(key)).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.entries.contains_key(&normalize_key(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order (spec §5 ordering guarantee).
    pub fn iter(&self) -> impl Iterator<Item = (&MapKey, &Value)> {
        self.entries.values().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &MapKey> {
        self.entries.values().map(|(k, _)| k)
    }
}

impl PartialEq for OrderedMap {
    fn eq(&self, other: &Self) -> bool {
        crate::equality::maps_equal(self, other)
    }
}

/// The tagged union of all CEL runtime values (spec §3, §9).
///
/// `Error` and `Unknown` may appear as intermediate values during non-strict
/// evaluation; neither ever escapes a top-level [`crate::Program::eval`] call
/// as a `Value` — `Error` is converted to `Result::Err` and `Unknown` to the
/// dedicated unknown-set return path.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(Rc<str>),
    Bytes(Rc<[u8]>),
    Duration(Duration),
    Timestamp(Timestamp),
    List(Rc<[Value]>),
    Map(Rc<OrderedMap>),
    /// Opaque host message, only ever produced/consumed through
    /// [`crate::type_provider::TypeProvider`]; never matched upon directly by
    /// the interpreter except to hand it back to the provider.
    Message(Rc<dyn crate::type_provider::Message>),
    Type(TypeValue),
    Optional(Option<Box<Value>>),
    /// Carried only in non-strict evaluation contexts; see module docs.
    Unknown(UnknownSet),
    /// Carried only in non-strict evaluation contexts; see module docs.
    Error(Rc<EvalError>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::from(items))
    }

    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn bytes(b: impl Into<Rc<[u8]>>) -> Self {
        Value::Bytes(b.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn type_value(&self) -> TypeValue {
        match self {
            Value::Null => TypeValue::Null,
            Value::Bool(_) => TypeValue::Bool,
            Value::Int(_) => TypeValue::Int,
            Value::Uint(_) => TypeValue::Uint,
            Value::Double(_) => TypeValue::Double,
            Value::String(_) => TypeValue::String,
            Value::Bytes(_) => TypeValue::Bytes,
            Value::Duration(_) => TypeValue::Duration,
            Value::Timestamp(_) => TypeValue::Timestamp,
            Value::List(_) => TypeValue::List,
            Value::Map(_) => TypeValue::Map,
            Value::Message(m) => TypeValue::Message(Rc::from(m.type_name())),
            Value::Type(_) => TypeValue::Type,
            Value::Optional(_) => TypeValue::Optional,
            Value::Unknown(_) | Value::Error(_) => {
                unreachable!("type_value() is never called on carried error/unknown values")
            }
        }
    }

    /// A qualifier suitable for indexing/field-select, if this value can be
    /// used as one (spec §4.H index_list/index_map attribute qualification).
    pub fn as_qualifier(&self) -> Option<crate::attribute::Qualifier> {
        use crate::attribute::Qualifier;
        match self {
            Value::Bool(b) => Some(Qualifier::Bool(*b)),
            Value::Int(i) => Some(Qualifier::Int(*i)),
            Value::Uint(u) => Some(Qualifier::Uint(*u)),
            Value::String(s) => Some(Qualifier::String(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}u"),
            Value::Double(d) => write!(f, "{d}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "b\"{}\"", crate::strings::bytes_repr(b)),
            Value::Duration(d) => write!(f, "{}", crate::time::format_duration(*d)),
            Value::Timestamp(t) => write!(f, "{}", crate::time::format_timestamp(*t)),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match k {
                        MapKey::Bool(b) => write!(f, "{b}: {v}")?,
                        MapKey::Int(n) => write!(f, "{n}: {v}")?,
                        MapKey::Uint(n) => write!(f, "{n}u: {v}")?,
                        MapKey::String(s) => write!(f, "{s:?}: {v}")?,
                    }
                }
                write!(f, "}}")
            }
            Value::Message(m) => write!(f, "{}{{...}}", m.type_name()),
            Value::Type(t) => write!(f, "type({t})"),
            Value::Optional(Some(v)) => write!(f, "optional({v})"),
            Value::Optional(None) => write!(f, "optional.none()"),
            Value::Unknown(_) => write!(f, "<unknown>"),
            Value::Error(e) => write!(f, "<error: {e}>"),
        }
    }
}

/// Numeric ordering used by heterogeneous comparisons and by the `Ord` used
/// to sort mixed-key diagnostics; NaN compares as [`None`] (spec §4.E).
pub fn numeric_partial_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    crate::numeric::heterogeneous_cmp(a, b)
}

impl Value {
    /// Renders a value as JSON for diagnostics and host interop, following
    /// the same lossy conventions protobuf's JSON mapping uses for CEL's
    /// wider types: a uint64/int64 that doesn't fit a JS-safe integer stays
    /// a JSON number anyway (this crate targets Rust hosts, not browsers);
    /// bytes become base64, durations/timestamps their canonical strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Int(i) => J::Number((*i).into()),
            Value::Uint(u) => serde_json::Number::from_f64(*u as f64).map(J::Number).unwrap_or(J::Null),
            Value::Double(d) => serde_json::Number::from_f64(*d).map(J::Number).unwrap_or(J::Null),
            Value::String(s) => J::String(s.to_string()),
            Value::Bytes(b) => J::String(base64_encode(b)),
            Value::Duration(d) => J::String(crate::time::format_duration(*d)),
            Value::Timestamp(t) => J::String(crate::time::format_timestamp(*t)),
            Value::List(items) => J::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => {
                let mut obj = serde_json::Map::with_capacity(map.len());
                for (k, v) in map.iter() {
                    let key = match k {
                        MapKey::Bool(b) => b.to_string(),
                        MapKey::Int(i) => i.to_string(),
                        MapKey::Uint(u) => u.to_string(),
                        MapKey::String(s) => s.to_string(),
                    };
                    obj.insert(key, v.to_json());
                }
                J::Object(obj)
            }
            Value::Message(m) => J::String(format!("{}{{...}}", m.type_name())),
            Value::Type(t) => J::String(t.to_string()),
            Value::Optional(Some(v)) => v.to_json(),
            Value::Optional(None) => J::Null,
            Value::Unknown(_) => J::Null,
            Value::Error(e) => J::String(e.to_string()),
        }
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);
        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        out.push(if chunk.len() > 1 { ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char } else { '=' });
        out.push(if chunk.len() > 2 { ALPHABET[(b2 & 0x3f) as usize] as char } else { '=' });
    }
    out
}

#[cfg(test)]
mod json_tests {
    use super::*;

    #[test]
    fn list_and_map_round_trip_to_json() {
        let mut map = OrderedMap::new();
        map.insert(MapKey::String(Rc::from("k")), Value::Int(1));
        let v = Value::list(vec![Value::Map(Rc::new(map)), Value::Bool(true)]);
        let json = v.to_json();
        assert_eq!(json[0]["k"], 1);
        assert_eq!(json[1], true);
    }

    #[test]
    fn bytes_encode_as_base64() {
        assert_eq!(Value::bytes(b"Mn".to_vec()).to_json(), serde_json::Value::String("TW4=".into()));
    }
}
