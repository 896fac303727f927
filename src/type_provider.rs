//! External collaborator interfaces (spec §6).
//!
//! Descriptor-pool lookup and message construction for the host proto
//! ecosystem are out of scope (spec §1); this module defines only the
//! contract the interpreter consumes from them, so the crate can be tested
//! and used without any real proto runtime attached.

use std::fmt;

use crate::{error::EvalResult, value::Value};

/// An opaque host message value. The interpreter never inspects a message's
/// fields directly — it always goes through [`TypeProvider`].
pub trait Message: fmt::Debug {
    fn type_name(&self) -> &str;
}

/// Consumed by the interpreter for field access, `has()`, value
/// normalization, and the `type(x)` operator (spec §6).
pub trait TypeProvider {
    /// Constructs a message value of `type_name` from a set of field values.
    fn create_message(&self, type_name: &str, fields: Vec<(String, Value)>) -> EvalResult<Value>;

    /// Returns the value of `field` on `obj`; unset fields yield the
    /// field-type default, never an error.
    fn select_field(&self, obj: &Value, field: &str) -> EvalResult<Value>;

    /// CEL `has()` semantics: presence for singular fields, non-emptiness
    /// for repeated/map fields.
    fn has_field(&self, obj: &Value, field: &str) -> EvalResult<bool>;

    /// Normalizes a host value to a runtime value, e.g. unwrapping a proto
    /// well-known wrapper message to its primitive payload.
    fn adapt(&self, value: Value) -> Value;

    /// Returns a first-class type-value for a checked type name.
    fn adapt_type(&self, checked_type_name: &str) -> EvalResult<Value>;

    /// Implements the `type(x)` operator: resolves `v`'s runtime type,
    /// consulting `expected_type_value` when `v` is a message whose dynamic
    /// type needs disambiguating against the checker's static type.
    fn resolve_object_type(&self, v: &Value, expected_type_value: &Value) -> EvalResult<Value>;
}

/// A [`TypeProvider`] with no messages registered, suitable for programs
/// that only use primitive CEL types. All field/message operations report
/// `type_not_found`; `adapt` and `resolve_object_type` are the identity
/// (beyond the fixed primitive type table).
#[derive(Debug, Default)]
pub struct EmptyTypeProvider;

impl TypeProvider for EmptyTypeProvider {
    fn create_message(&self, type_name: &str, _fields: Vec<(String, Value)>) -> EvalResult<Value> {
        Err(crate::error::EvalError::type_not_found(format!("unknown message type: {type_name}")))
    }

    fn select_field(&self, _obj: &Value, field: &str) -> EvalResult<Value> {
        Err(crate::error::EvalError::attribute_not_found(format!("no such field: {field}")))
    }

    fn has_field(&self, _obj: &Value, _field: &str) -> EvalResult<bool> {
        Ok(false)
    }

    fn adapt(&self, value: Value) -> Value {
        value
    }

    fn adapt_type(&self, checked_type_name: &str) -> EvalResult<Value> {
        Err(crate::error::EvalError::type_not_found(format!("unknown type: {checked_type_name}")))
    }

    fn resolve_object_type(&self, v: &Value, _expected_type_value: &Value) -> EvalResult<Value> {
        Ok(Value::Type(v.type_value()))
    }
}

/// The fixed set of protobuf well-known wrapper message types that
/// `unwrap_well_known_types_on_dispatch` unwraps to a primitive after a
/// function dispatch (spec §3, expanded in SPEC_FULL.md §2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownWrapper {
    BoolValue,
    Int32Value,
    Int64Value,
    UInt32Value,
    UInt64Value,
    FloatValue,
    DoubleValue,
    StringValue,
    BytesValue,
}

impl WellKnownWrapper {
    pub fn from_type_name(name: &str) -> Option<Self> {
        Some(match name {
            "google.protobuf.BoolValue" => Self::BoolValue,
            "google.protobuf.Int32Value" => Self::Int32Value,
            "google.protobuf.Int64Value" => Self::Int64Value,
            "google.protobuf.UInt32Value" => Self::UInt32Value,
            "google.protobuf.UInt64Value" => Self::UInt64Value,
            "google.protobuf.FloatValue" => Self::FloatValue,
            "google.protobuf.DoubleValue" => Self::DoubleValue,
            "google.protobuf.StringValue" => Self::StringValue,
            "google.protobuf.BytesValue" => Self::BytesValue,
            _ => return None,
        })
    }
}
