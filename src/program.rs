//! A checked program bound to its dispatcher, type provider, and options
//! (spec §3 "Program", §4.H top-level `eval`).
//!
//! Grounded on the teacher's `prepare.rs`/`run.rs` split between an
//! immutable prepared unit and the mutable state of one run: `Program` is
//! the immutable half, [`crate::frame::Frame`] the mutable half.

use std::rc::Rc;

use crate::{
    ast::Expr,
    attribute::AttributePattern,
    dispatcher::Dispatcher,
    error::{EvalError, EvalResult},
    frame::{EvaluationListener, FunctionResolver, Frame, NoopListener},
    options::EvalOptions,
    resolver::{ResolverStack, VariableResolver},
    type_provider::TypeProvider,
    unknown::UnknownSet,
    value::Value,
};

/// The result of a top-level evaluation: either a concrete value or an
/// accumulated unknown-set, never a carried [`Value::Error`] (that always
/// becomes `Err` instead, spec §4.F).
#[derive(Debug, Clone)]
pub enum EvalOutcome {
    Value(Value),
    Unknown(UnknownSet),
}

impl EvalOutcome {
    pub fn into_value(self) -> Option<Value> {
        match self {
            EvalOutcome::Value(v) => Some(v),
            EvalOutcome::Unknown(_) => None,
        }
    }
}

/// An immutable bundle of a checked AST, its overload dispatcher, type
/// provider, declared unknown-attribute patterns, and evaluation options
/// (spec §3). Cheap to clone: everything heap-shaped is behind `Rc`.
pub struct Program<P: TypeProvider> {
    root: Rc<Expr>,
    dispatcher: Dispatcher,
    type_provider: P,
    unknown_patterns: Vec<AttributePattern>,
    options: EvalOptions,
}

impl<P: TypeProvider> Program<P> {
    pub fn new(
        root: Expr,
        dispatcher: Dispatcher,
        type_provider: P,
        unknown_patterns: Vec<AttributePattern>,
        options: EvalOptions,
    ) -> Self {
        Self { root: Rc::new(root), dispatcher, type_provider, unknown_patterns, options }
    }

    pub fn options(&self) -> EvalOptions {
        self.options
    }

    /// Evaluates the program once against `vars`, with no listener and no
    /// late-bound function resolver.
    pub fn eval(&self, vars: &dyn VariableResolver) -> EvalResult<EvalOutcome> {
        let listener = NoopListener;
        self.eval_with(vars, &listener, None)
    }

    /// Evaluates the program against `vars`, notifying `listener` after
    /// every node and consulting `function_resolver` for calls the built-in
    /// dispatcher does not cover (spec §6).
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn eval_with(
        &self,
        vars: &dyn VariableResolver,
        listener: &dyn EvaluationListener,
        function_resolver: Option<&dyn FunctionResolver>,
    ) -> EvalResult<EvalOutcome> {
        let resolver = ResolverStack::new(vars, &self.unknown_patterns, self.options.enable_unknown_tracking);
        let mut frame = Frame::new(resolver, self.options, listener, function_resolver);
        let interpreter = crate::interpreter::Interpreter::new(&self.dispatcher, &self.type_provider);
        let resolved = interpreter.eval_expr(&self.root, &mut frame);
        match resolved.value {
            Value::Error(e) => {
                let e = unwrap_rc(e);
                tracing::debug!(kind = %e.kind, message = %e.message, "evaluation raised an error");
                Err(e)
            }
            Value::Unknown(u) => {
                tracing::trace!(attributes = u.attributes().len(), "evaluation produced an unknown set");
                Ok(EvalOutcome::Unknown(u))
            }
            other => Ok(EvalOutcome::Value(other)),
        }
    }

    /// Re-evaluates the program against `vars`, which is expected to now
    /// resolve some of the attributes that previously produced
    /// `previous_unknown` (spec's partial-evaluation contract, see
    /// SPEC_FULL.md §2 "advance_evaluation"). Resuming mid-evaluation from a
    /// cached partial result is not implemented: since every carried
    /// intermediate value is already immutable and cheap to recompute, this
    /// simply re-runs `eval` with the now-more-complete resolver, which is
    /// observably identical to true incremental resumption for a
    /// side-effect-free language.
    pub fn advance_evaluation(&self, vars: &dyn VariableResolver, previous_unknown: &UnknownSet) -> EvalResult<EvalOutcome> {
        let _ = previous_unknown;
        self.eval(vars)
    }
}

fn unwrap_rc(e: Rc<EvalError>) -> EvalError {
    Rc::try_unwrap(e).unwrap_or_else(|rc| (*rc).clone())
}
