//! Per-evaluation execution frame (spec §3 "Execution frame", §4.H lazy
//! expressions).

use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::Expr,
    options::EvalOptions,
    resolver::{LazySlot, ResolverStack, Resolved},
    value::Value,
};

/// Consumed for late-bound (host-supplied) function calls not covered by
/// the built-in standard library dispatcher (spec §6).
pub trait FunctionResolver {
    fn find_overload(&self, function_name: &str, overload_ids: &[Rc<str>], args: &[Value]) -> Option<Value>;
}

/// Consumed after every node evaluation; must not mutate shared state or
/// panic (spec §6).
pub trait EvaluationListener {
    fn on_eval(&self, expr: &Expr, value: &Value);
}

/// A no-op listener, the default when the caller supplies none.
#[derive(Debug, Default)]
pub struct NoopListener;

impl EvaluationListener for NoopListener {
    fn on_eval(&self, _expr: &Expr, _value: &Value) {}
}

/// A thunk bound by a lazy-bind macro (`cel.bind`) or the `cel_block_list`
/// CSE form: an expression evaluated at most once per binding lifetime,
/// memoized on first access (spec glossary "Lazy expression").
struct LazyThunk {
    expr: Rc<Expr>,
    state: LazySlot,
    value: Option<Value>,
}

/// Per-evaluation mutable state: the lexical scope chain (via
/// [`ResolverStack`]), the iteration counter, the evaluation listener, and
/// an optional late-bound function resolver. Lifetime: a single evaluation
/// (spec §3).
pub struct Frame<'a> {
    pub resolver: ResolverStack<'a>,
    pub options: EvalOptions,
    iteration_count: i64,
    listener: &'a dyn EvaluationListener,
    function_resolver: Option<&'a dyn FunctionResolver>,
    lazy_thunks: HashMap<Rc<str>, LazyThunk>,
}

impl<'a> Frame<'a> {
    pub fn new(
        resolver: ResolverStack<'a>,
        options: EvalOptions,
        listener: &'a dyn EvaluationListener,
        function_resolver: Option<&'a dyn FunctionResolver>,
    ) -> Self {
        Self { resolver, options, iteration_count: 0, listener, function_resolver, lazy_thunks: HashMap::new() }
    }

    pub fn notify(&self, expr: &Expr, value: &Value) {
        self.listener.on_eval(expr, value);
    }

    pub fn function_resolver(&self) -> Option<&'a dyn FunctionResolver> {
        self.function_resolver
    }

    /// Increments the shared per-evaluation iteration counter (every
    /// iteration of every, possibly nested, comprehension counts once) and
    /// reports whether the configured budget was exceeded.
    pub fn tick_iteration(&mut self) -> bool {
        self.iteration_count += 1;
        let budget = self.options.comprehension_max_iterations;
        budget >= 0 && self.iteration_count > budget
    }

    pub fn declare_lazy_thunk(&mut self, name: Rc<str>, expr: Rc<Expr>) {
        self.lazy_thunks.insert(name, LazyThunk { expr, state: LazySlot::Pending, value: None });
    }

    pub fn remove_lazy_thunk(&mut self, name: &str) {
        self.lazy_thunks.remove(name);
    }

    /// Returns the pending thunk expression for `name`, if one is declared
    /// and not yet forced.
    pub fn pending_thunk(&self, name: &str) -> Option<Rc<Expr>> {
        match self.lazy_thunks.get(name) {
            Some(LazyThunk { state: LazySlot::Pending, expr, .. }) => Some(expr.clone()),
            _ => None,
        }
    }

    /// Returns the already-forced value for `name`, if any.
    pub fn forced_thunk(&self, name: &str) -> Option<Value> {
        match self.lazy_thunks.get(name) {
            Some(LazyThunk { state: LazySlot::Forced, value: Some(v), .. }) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn force_thunk(&mut self, name: &str, value: Value) {
        if let Some(thunk) = self.lazy_thunks.get_mut(name) {
            thunk.state = LazySlot::Forced;
            thunk.value = Some(value);
        }
    }

    pub fn has_thunk(&self, name: &str) -> bool {
        self.lazy_thunks.contains_key(name)
    }

    pub fn push_scope(&mut self, bindings: HashMap<Rc<str>, Resolved>) {
        self.resolver.push_scope(bindings);
    }

    pub fn pop_scope(&mut self) {
        self.resolver.pop_scope();
    }
}
