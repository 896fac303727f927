//! Shared AST builders for integration tests.
//!
//! There is no parser in scope, so every test builds its checked AST by
//! hand; these helpers keep that construction terse and give every node a
//! unique id via a shared counter.

#![allow(dead_code)]

use std::{cell::Cell, collections::HashMap, rc::Rc};

use cel_runtime::{
    Attribute, AttributePattern, Call, Comprehension, Constant, EmptyTypeProvider, Entry, Expr, ExprId, ExprKind,
    EvalOptions, IdentKind, MapVariableResolver, Program, SpecialCall, Value,
};

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

/// Installs a fmt subscriber filtered by `RUST_LOG` so `cargo test -- --nocapture`
/// shows the interpreter's `tracing` output. Safe to call from every test;
/// `try_init` is a no-op once a global subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).with_test_writer().try_init();
}

pub fn next_id() -> ExprId {
    NEXT_ID.with(|c| {
        let id = c.get();
        c.set(id + 1);
        ExprId::new(id)
    })
}

pub fn e(kind: ExprKind) -> Expr {
    Expr::new(next_id(), kind)
}

pub fn const_int(v: i64) -> Expr {
    e(ExprKind::Const(Constant::Int(v)))
}

pub fn const_uint(v: u64) -> Expr {
    e(ExprKind::Const(Constant::Uint(v)))
}

pub fn const_double(v: f64) -> Expr {
    e(ExprKind::Const(Constant::Double(v)))
}

pub fn const_str(s: &str) -> Expr {
    e(ExprKind::Const(Constant::String(Rc::from(s))))
}

pub fn const_bool(b: bool) -> Expr {
    e(ExprKind::Const(Constant::Bool(b)))
}

pub fn ident(name: &str) -> Expr {
    e(ExprKind::Ident { name: Rc::from(name), kind: IdentKind::Variable })
}

pub fn call(function: &str, overload_ids: &[&str], args: Vec<Expr>) -> Expr {
    e(ExprKind::Call(Call {
        function: Rc::from(function),
        overload_ids: overload_ids.iter().map(|s| Rc::from(*s)).collect(),
        args,
        is_index: false,
    }))
}

pub fn index_call(function: &str, overload_ids: &[&str], args: Vec<Expr>) -> Expr {
    e(ExprKind::Call(Call {
        function: Rc::from(function),
        overload_ids: overload_ids.iter().map(|s| Rc::from(*s)).collect(),
        args,
        is_index: true,
    }))
}

pub fn list(items: Vec<Expr>) -> Expr {
    e(ExprKind::List(items))
}

pub fn map_literal(entries: Vec<(Expr, Expr)>) -> Expr {
    e(ExprKind::Map(
        entries.into_iter().map(|(key, value)| Entry { key: Box::new(key), value: Box::new(value), optional: false }).collect(),
    ))
}

pub fn select(operand: Expr, field: &str) -> Expr {
    e(ExprKind::Select { operand: Box::new(operand), field: Rc::from(field), test_only: false })
}

pub fn has(operand: Expr, field: &str) -> Expr {
    e(ExprKind::Select { operand: Box::new(operand), field: Rc::from(field), test_only: true })
}

pub fn logical_and(a: Expr, b: Expr) -> Expr {
    e(ExprKind::Special(SpecialCall::LogicalAnd(Box::new(a), Box::new(b))))
}

pub fn logical_or(a: Expr, b: Expr) -> Expr {
    e(ExprKind::Special(SpecialCall::LogicalOr(Box::new(a), Box::new(b))))
}

pub fn conditional(cond: Expr, then: Expr, otherwise: Expr) -> Expr {
    e(ExprKind::Special(SpecialCall::Conditional { cond: Box::new(cond), then: Box::new(then), otherwise: Box::new(otherwise) }))
}

pub fn comprehension(
    iter_var: &str,
    iter_range: Expr,
    accu_var: &str,
    accu_init: Expr,
    loop_condition: Expr,
    loop_step: Expr,
    result: Expr,
) -> Expr {
    e(ExprKind::Comprehension(Box::new(Comprehension {
        iter_var: Rc::from(iter_var),
        iter_range: Box::new(iter_range),
        accu_var: Rc::from(accu_var),
        accu_init: Box::new(accu_init),
        loop_condition: Box::new(loop_condition),
        loop_step: Box::new(loop_step),
        result: Box::new(result),
    })))
}

pub fn vars(bindings: Vec<(&str, Value)>) -> MapVariableResolver {
    let mut m = HashMap::new();
    for (k, v) in bindings {
        m.insert(k.to_string(), v);
    }
    MapVariableResolver::new(m)
}

pub fn program(root: Expr, options: EvalOptions) -> Program<EmptyTypeProvider> {
    let dispatcher = cel_runtime::stdlib::build(options);
    Program::new(root, dispatcher, EmptyTypeProvider, Vec::new(), options)
}

pub fn program_with_unknowns(root: Expr, options: EvalOptions, patterns: &[&str]) -> Program<EmptyTypeProvider> {
    let dispatcher = cel_runtime::stdlib::build(options);
    let patterns = patterns.iter().map(|p| AttributePattern::parse(p).unwrap()).collect();
    Program::new(root, dispatcher, EmptyTypeProvider, patterns, options)
}

pub fn attr(root: &str, fields: &[&str]) -> Attribute {
    let mut a = Attribute::from_identifier(root);
    for f in fields {
        a = a.qualify(cel_runtime::Qualifier::String(Rc::from(*f)));
    }
    a
}
