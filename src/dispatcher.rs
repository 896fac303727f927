//! Overload dispatch table (spec §4.D).
//!
//! Grounded on the teacher's flat `builtins`/`function.rs` overload-id
//! tables: a function is a plain `fn(&[Value]) -> EvalResult<Value>`, keyed
//! in a flat map by overload id (spec §9 design notes).

use std::{collections::HashMap, rc::Rc};

use crate::{
    error::{EvalError, EvalResult},
    value::{TypeValue, Value},
};

/// A per-argument type predicate used to match a call's runtime argument
/// types against an overload's declared signature.
pub type ArgTypePredicate = fn(&TypeValue) -> bool;

pub type OverloadFn = Rc<dyn Fn(&[Value]) -> EvalResult<Value>>;

/// One entry in the dispatcher: arity (implied by `arg_types.len()`),
/// per-argument type predicates, strictness, and the implementation.
#[derive(Clone)]
pub struct Overload {
    pub arg_types: Vec<ArgTypePredicate>,
    /// If strict, the dispatcher never invokes `implementation` when any
    /// argument is an error or unknown; the interpreter handles propagation
    /// instead (spec §4.D).
    pub strict: bool,
    pub implementation: OverloadFn,
}

impl Overload {
    fn accepts(&self, args: &[Value]) -> bool {
        if self.arg_types.len() != args.len() {
            return false;
        }
        self.arg_types.iter().zip(args).all(|(predicate, arg)| predicate(&arg.type_value()))
    }
}

/// A table keyed by overload id. Construction time (`add_overload`) is the
/// only place duplicate ids are rejected; lookup time (`find_overload`) is
/// where ambiguity between multiple *candidate* ids for one call site is
/// rejected.
#[derive(Default, Clone)]
pub struct Dispatcher {
    overloads: HashMap<Rc<str>, Overload>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `overload_id`; re-registering the same id is a
    /// configuration error (the teacher's dispatcher treats this the same
    /// way, spec §4.D).
    pub fn add_overload(&mut self, overload_id: impl Into<Rc<str>>, overload: Overload) -> Result<(), String> {
        let overload_id = overload_id.into();
        if self.overloads.contains_key(&overload_id) {
            return Err(format!("duplicate overload id: {overload_id}"));
        }
        self.overloads.insert(overload_id, overload);
        Ok(())
    }

    /// Selects the first overload id in `candidate_overload_ids` whose
    /// argument predicates all accept `args`' runtime types. If two or more
    /// candidates match, resolution fails as ambiguous — the spec's chosen
    /// uniqueness policy (spec §4.D, §9 open question), rather than silently
    /// picking the first match.
    pub fn find_overload(
        &self,
        function_name: &str,
        candidate_overload_ids: &[Rc<str>],
        args: &[Value],
    ) -> EvalResult<&Overload> {
        let mut matched: Option<&Overload> = None;
        for id in candidate_overload_ids {
            let Some(overload) = self.overloads.get(id) else { continue };
            if overload.accepts(args) {
                if matched.is_some() {
                    tracing::warn!(function_name, ?candidate_overload_ids, "ambiguous overload candidates");
                    return Err(EvalError::overload_not_found(function_name));
                }
                matched = Some(overload);
            }
        }
        matched.ok_or_else(|| EvalError::overload_not_found(function_name))
    }

    pub fn dispatch(
        &self,
        function_name: &str,
        candidate_overload_ids: &[Rc<str>],
        args: &[Value],
    ) -> EvalResult<Value> {
        let overload = self.find_overload(function_name, candidate_overload_ids, args)?;
        (overload.implementation)(args)
    }
}

pub mod predicates {
    use crate::value::TypeValue;

    pub fn any(_t: &TypeValue) -> bool {
        true
    }

    pub fn is_bool(t: &TypeValue) -> bool {
        matches!(t, TypeValue::Bool)
    }

    pub fn is_int(t: &TypeValue) -> bool {
        matches!(t, TypeValue::Int)
    }

    pub fn is_uint(t: &TypeValue) -> bool {
        matches!(t, TypeValue::Uint)
    }

    pub fn is_double(t: &TypeValue) -> bool {
        matches!(t, TypeValue::Double)
    }

    pub fn is_string(t: &TypeValue) -> bool {
        matches!(t, TypeValue::String)
    }

    pub fn is_bytes(t: &TypeValue) -> bool {
        matches!(t, TypeValue::Bytes)
    }

    pub fn is_list(t: &TypeValue) -> bool {
        matches!(t, TypeValue::List)
    }

    pub fn is_map(t: &TypeValue) -> bool {
        matches!(t, TypeValue::Map)
    }

    pub fn is_duration(t: &TypeValue) -> bool {
        matches!(t, TypeValue::Duration)
    }

    pub fn is_timestamp(t: &TypeValue) -> bool {
        matches!(t, TypeValue::Timestamp)
    }
}
