//! Benchmarks for `Program::eval`.
//!
//! Grounded on the teacher's `benches/arithmetic_non_foldable.rs`: the same
//! non-foldable-body idea (force repeated runtime work rather than a single
//! constant-folded return) carried over to hand-built checked ASTs, since
//! parsing is out of scope here and there is no source text to feed a
//! frontend.

use std::rc::Rc;

use cel_runtime::{
    Call, Comprehension, Constant, EmptyTypeProvider, Expr, ExprId, ExprKind, EvalOptions,
    MapVariableResolver, Program,
};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn id(n: u64) -> ExprId {
    ExprId::new(n)
}

fn ident(n: u64, name: &str) -> Expr {
    Expr::new(id(n), ExprKind::Ident { name: Rc::from(name), kind: cel_runtime::IdentKind::Variable })
}

fn const_int(n: u64, v: i64) -> Expr {
    Expr::new(id(n), ExprKind::Const(Constant::Int(v)))
}

fn add(n: u64, a: Expr, b: Expr) -> Expr {
    Expr::new(
        id(n),
        ExprKind::Call(Call {
            function: Rc::from("_+_"),
            overload_ids: vec![Rc::from("add_int64_int64")],
            args: vec![a, b],
            is_index: false,
        }),
    )
}

/// `x + y` where `x` and `y` are bound variables, never folded at build time.
fn add_two_locals() -> Expr {
    add(1, ident(2, "x"), ident(3, "y"))
}

/// `[1, 1, ..., 1].fold(0, sum + _)`, the comprehension-shaped equivalent of
/// the teacher's `for _ in range(1000): total += x + y` loop: 1000 additions
/// of two runtime ints, accumulated through the accu_var.
fn add_loop_1000() -> Expr {
    let range_items: Vec<Expr> = (0..1000u64).map(|i| const_int(100 + i, 1)).collect();
    let range = Expr::new(id(10), ExprKind::List(range_items));
    let accu_init = const_int(11, 0);
    let loop_condition = Expr::new(id(12), ExprKind::Const(Constant::Bool(true)));
    let loop_step = add(13, ident(14, "__result__"), add(15, ident(16, "x"), ident(17, "y")));
    let result = ident(18, "__result__");
    Expr::new(
        id(19),
        ExprKind::Comprehension(Box::new(Comprehension {
            iter_var: Rc::from("__iter__"),
            iter_range: Box::new(range),
            accu_var: Rc::from("__result__"),
            accu_init: Box::new(accu_init),
            loop_condition: Box::new(loop_condition),
            loop_step: Box::new(loop_step),
            result: Box::new(result),
        })),
    )
}

fn vars(x: i64, y: i64) -> MapVariableResolver {
    let mut m = std::collections::HashMap::new();
    m.insert("x".to_string(), cel_runtime::Value::Int(x));
    m.insert("y".to_string(), cel_runtime::Value::Int(y));
    MapVariableResolver::new(m)
}

fn make_program(root: Expr) -> Program<EmptyTypeProvider> {
    let options = EvalOptions::default();
    let dispatcher = cel_runtime::stdlib::build(options);
    Program::new(root, dispatcher, EmptyTypeProvider, Vec::new(), options)
}

fn criterion_benchmark(c: &mut Criterion) {
    let add_two_locals_program = make_program(add_two_locals());
    let add_two_locals_vars = vars(1, 2);
    c.bench_function("add_two_locals", |b| {
        b.iter(|| {
            let outcome = add_two_locals_program.eval(&add_two_locals_vars).unwrap();
            black_box(outcome.into_value());
        });
    });

    let add_loop_program = make_program(add_loop_1000());
    let add_loop_vars = vars(1, 2);
    c.bench_function("add_loop_1000", |b| {
        b.iter(|| {
            let outcome = add_loop_program.eval(&add_loop_vars).unwrap();
            black_box(outcome.into_value());
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
