//! Lexically scoped resolver stack with a lazy-evaluation cache (spec §4.C).
//!
//! Grounded on the teacher's `namespace.rs`: an index-based stack rather than
//! linked parent pointers with shared ownership (spec §9 design notes),
//! avoiding reference cycles entirely since a frame's scope chain never
//! outlives the evaluation that owns it.

use std::{collections::HashMap, rc::Rc};

use crate::{
    attribute::{Attribute, AttributePattern},
    unknown::UnknownSet,
    value::Value,
};

/// An intermediate result: the symbolic path used to compute `value`
/// (empty unless unknown tracking is enabled and the subexpression is a
/// name/field/index chain), plus the value itself (spec §3 "Intermediate
/// result").
#[derive(Debug, Clone)]
pub struct Resolved {
    pub attribute: Option<Attribute>,
    pub value: Value,
}

impl Resolved {
    pub fn new(attribute: Option<Attribute>, value: Value) -> Self {
        Self { attribute, value }
    }

    pub fn bare(value: Value) -> Self {
        Self { attribute: None, value }
    }
}

/// Consumed by the base resolver: supplies concrete variable bindings.
pub trait VariableResolver {
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// A resolver with no bound variables; every identifier is unresolved.
#[derive(Debug, Default)]
pub struct EmptyVariableResolver;

impl VariableResolver for EmptyVariableResolver {
    fn resolve(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// A resolver backed by a plain name -> value map, the common case for
/// top-level `eval` calls.
#[derive(Debug, Default)]
pub struct MapVariableResolver(HashMap<String, Value>);

impl MapVariableResolver {
    pub fn new(bindings: HashMap<String, Value>) -> Self {
        Self(bindings)
    }
}

impl VariableResolver for MapVariableResolver {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.0.get(name).cloned()
    }
}

/// One level of the lexical scope chain: the bindings introduced at this
/// level (comprehension `iter_var`/`accu_var`, or nothing for the base
/// level) plus a lazy-binding cache shared across the whole frame.
struct ScopeLevel {
    bindings: HashMap<Rc<str>, Resolved>,
}

/// A thunk stored under a name, computed at most once (spec's "Lazy
/// expression" glossary entry). The interpreter stores the AST node to
/// evaluate; `ResolverStack` only tracks whether it has already been forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazySlot {
    Pending,
    Forced,
}

/// The per-frame scope chain plus the lazy-result cache used by bind-style
/// macros and the `cel_block_list` CSE form.
pub struct ResolverStack<'a> {
    base: &'a dyn VariableResolver,
    unknown_patterns: &'a [AttributePattern],
    track_attributes: bool,
    levels: Vec<ScopeLevel>,
    lazy_cache: HashMap<Rc<str>, (LazySlot, Option<Value>)>,
}

impl<'a> ResolverStack<'a> {
    /// `track_attributes` gates the whole attribute/unknown-pattern
    /// mechanism (spec §3 `enable_unknown_tracking`): when off, every
    /// intermediate result's attribute stays `None` and declared unknown
    /// patterns never match, since the mechanism is attribute-based.
    pub fn new(base: &'a dyn VariableResolver, unknown_patterns: &'a [AttributePattern], track_attributes: bool) -> Self {
        Self { base, unknown_patterns, track_attributes, levels: Vec::new(), lazy_cache: HashMap::new() }
    }

    /// Pushes a new child scope containing `bindings`.
    pub fn push_scope(&mut self, bindings: HashMap<Rc<str>, Resolved>) {
        self.levels.push(ScopeLevel { bindings });
    }

    /// Pops the innermost scope, restoring its parent.
    pub fn pop_scope(&mut self) {
        self.levels.pop();
    }

    /// Declares a thunk under `name` as not-yet-forced.
    pub fn declare_lazy(&mut self, name: Rc<str>) {
        self.lazy_cache.insert(name, (LazySlot::Pending, None));
    }

    /// Returns the lazy slot's current state, if `name` was declared lazy.
    pub fn lazy_state(&self, name: &str) -> Option<LazySlot> {
        self.lazy_cache.get(name).map(|(slot, _)| *slot)
    }

    /// Records the forced value of a lazy binding so subsequent lookups
    /// return it without re-evaluating.
    pub fn cache_lazy(&mut self, name: Rc<str>, value: Value) {
        self.lazy_cache.insert(name, (LazySlot::Forced, Some(value)));
    }

    fn lookup_local(&self, name: &str) -> Option<&Resolved> {
        self.levels.iter().rev().find_map(|level| level.bindings.get(name))
    }

    /// `resolve_simple(name, expr_id)` (spec §4.C): consults, in order, the
    /// innermost-to-outermost lexical scope, then the forced lazy cache,
    /// then declares an unknown if the name is in a declared unknown
    /// pattern, then falls back to the base resolver, and finally produces
    /// an unknown tagged with `expr_id` if nothing resolves it. When
    /// `track_attributes` is off, the attribute/unknown-pattern steps are
    /// skipped entirely and the result always carries `attribute: None`.
    pub fn resolve_simple(&self, name: &str, expr_id: crate::ast::ExprId) -> Resolved {
        if let Some(resolved) = self.lookup_local(name) {
            return resolved.clone();
        }
        if let Some((LazySlot::Forced, Some(value))) = self.lazy_cache.get(name) {
            return Resolved::bare(value.clone());
        }
        if !self.track_attributes {
            return match self.base.resolve(name) {
                Some(value) => Resolved::bare(value),
                None => Resolved::bare(Value::Unknown(UnknownSet::of_expr_id(expr_id))),
            };
        }
        let attr = Attribute::from_identifier(name);
        if self.unknown_patterns.iter().any(|p| p.matches(&attr)) {
            return Resolved::new(Some(attr), Value::Unknown(UnknownSet::of_expr_id(expr_id)));
        }
        match self.base.resolve(name) {
            Some(value) => Resolved::new(Some(attr), value),
            None => Resolved::new(Some(attr), Value::Unknown(UnknownSet::of_expr_id(expr_id))),
        }
    }

    /// Returns a known value bound to `attr`, if the resolver can answer for
    /// a (possibly partial) attribute without re-deriving it from the root
    /// identifier — the "attribute-indexed short-circuit" path (spec §4.H).
    pub fn resolve_attribute(&self, attr: &Attribute) -> Option<Value> {
        let level_hit = self.levels.iter().rev().find_map(|level| {
            level.bindings.get(attr.root()).filter(|r| r.attribute.as_ref() == Some(attr)).map(|r| r.value.clone())
        });
        level_hit
    }

    /// Returns the unknown set covering `attr` if any declared pattern
    /// matches a prefix of it (a "partial unknown").
    pub fn maybe_partial_unknown(&self, attr: &Attribute) -> Option<UnknownSet> {
        if !self.track_attributes {
            return None;
        }
        if self.unknown_patterns.iter().any(|p| p.matches(attr)) {
            Some(UnknownSet::of_attribute(attr.clone()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_shadow_outer_bindings() {
        let base = EmptyVariableResolver;
        let patterns = [];
        let mut stack = ResolverStack::new(&base, &patterns, true);
        let mut outer = HashMap::new();
        outer.insert(Rc::from("x"), Resolved::bare(Value::Int(1)));
        stack.push_scope(outer);
        let mut inner = HashMap::new();
        inner.insert(Rc::from("x"), Resolved::bare(Value::Int(2)));
        stack.push_scope(inner);
        assert!(matches!(stack.lookup_local("x").unwrap().value, Value::Int(2)));
        stack.pop_scope();
        assert!(matches!(stack.lookup_local("x").unwrap().value, Value::Int(1)));
    }

    #[test]
    fn unresolved_identifier_is_unknown() {
        let base = EmptyVariableResolver;
        let patterns = [];
        let stack = ResolverStack::new(&base, &patterns, true);
        let resolved = stack.resolve_simple("missing", crate::ast::ExprId::new(7));
        assert!(resolved.value.is_unknown());
    }

    #[test]
    fn declared_unknown_pattern_wins_over_absent_variable() {
        let base = EmptyVariableResolver;
        let patterns = [AttributePattern::parse("request.*").unwrap()];
        let stack = ResolverStack::new(&base, &patterns, true);
        let resolved = stack.resolve_simple("request", crate::ast::ExprId::new(1));
        assert!(resolved.value.is_unknown());
    }

    #[test]
    fn partial_unknown_matches_a_deeper_attribute_than_the_bare_root() {
        use crate::attribute::Qualifier;
        let base = EmptyVariableResolver;
        let patterns = [AttributePattern::parse("request.*").unwrap()];
        let stack = ResolverStack::new(&base, &patterns, true);
        // The pattern's wildcard qualifier means it never matches the bare
        // root, only a root qualified at least one level deep.
        assert!(stack.maybe_partial_unknown(&Attribute::from_identifier("request")).is_none());
        let user_id = Attribute::from_identifier("request")
            .qualify(Qualifier::String(Rc::from("user")))
            .qualify(Qualifier::String(Rc::from("id")));
        let unknown = stack.maybe_partial_unknown(&user_id).expect("deeper attribute matches the wildcard pattern");
        assert!(unknown.attributes().contains(&user_id));
    }

    #[test]
    fn disabling_attribute_tracking_leaves_the_attribute_empty_and_ignores_patterns() {
        use crate::attribute::Qualifier;
        let base = EmptyVariableResolver;
        let patterns = [AttributePattern::parse("request.*").unwrap()];
        let stack = ResolverStack::new(&base, &patterns, false);
        let resolved = stack.resolve_simple("request", crate::ast::ExprId::new(1));
        assert!(resolved.attribute.is_none());
        // Still unresolved -> unknown, but not because a pattern matched.
        assert!(resolved.value.is_unknown());
        let user_id = Attribute::from_identifier("request")
            .qualify(Qualifier::String(Rc::from("user")))
            .qualify(Qualifier::String(Rc::from("id")));
        assert!(stack.maybe_partial_unknown(&user_id).is_none());
    }

    #[test]
    fn lazy_cache_returns_forced_value_without_rebinding() {
        let base = EmptyVariableResolver;
        let patterns = [];
        let mut stack = ResolverStack::new(&base, &patterns, true);
        stack.declare_lazy(Rc::from("x"));
        assert_eq!(stack.lazy_state("x"), Some(LazySlot::Pending));
        stack.cache_lazy(Rc::from("x"), Value::Int(42));
        assert_eq!(stack.lazy_state("x"), Some(LazySlot::Forced));
        let resolved = stack.resolve_simple("x", crate::ast::ExprId::new(2));
        assert!(matches!(resolved.value, Value::Int(42)));
    }
}
