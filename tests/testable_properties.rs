//! The invariants from spec §8, each pinned down with concrete inputs.

mod common;

use cel_runtime::{EvalOptions, EvalOutcome, ErrorKind, Value};
use common::*;

#[test]
fn determinism_repeated_eval_is_stable() {
    let expr = call("_+_", &["add_int64_int64"], vec![ident("x"), const_int(1)]);
    let p = program(expr, EvalOptions::default());
    let vars = vars(vec![("x", Value::Int(41))]);
    let first = p.eval(&vars).unwrap().into_value().unwrap();
    let second = p.eval(&vars).unwrap().into_value().unwrap();
    assert!(matches!((first, second), (Value::Int(a), Value::Int(b)) if a == b));
}

#[test]
fn logical_or_short_circuits_true_past_an_erroring_right_side() {
    let erroring = call("_/_", &["divide_int64_int64"], vec![const_int(1), const_int(0)]);
    let expr = logical_or(const_bool(true), erroring);
    let p = program(expr, EvalOptions::default());
    let v = p.eval(&vars(vec![])).unwrap().into_value().unwrap();
    assert!(matches!(v, Value::Bool(true)));
}

#[test]
fn logical_and_short_circuits_false_past_an_erroring_right_side() {
    let erroring = call("_/_", &["divide_int64_int64"], vec![const_int(1), const_int(0)]);
    let expr = logical_and(const_bool(false), erroring);
    let p = program(expr, EvalOptions::default());
    let v = p.eval(&vars(vec![])).unwrap().into_value().unwrap();
    assert!(matches!(v, Value::Bool(false)));
}

#[test]
fn disabling_short_circuiting_still_yields_the_absorbing_result() {
    let erroring = call("_/_", &["divide_int64_int64"], vec![const_int(1), const_int(0)]);
    let expr = logical_or(const_bool(true), erroring);
    let options = EvalOptions { enable_short_circuiting: false, ..EvalOptions::default() };
    let p = program(expr, options);
    let v = p.eval(&vars(vec![])).unwrap().into_value().unwrap();
    assert!(matches!(v, Value::Bool(true)));
}

#[test]
fn heterogeneous_negative_int_is_less_than_positive_uint() {
    let options = EvalOptions::default();
    let lt = call("_<_", &["less_than"], vec![const_int(-1), const_uint(1)]);
    let gt = call("_>_", &["greater_than"], vec![const_int(-1), const_uint(1)]);
    let eq = call("_==_", &["equals"], vec![const_int(-1), const_uint(1)]);
    assert!(matches!(program(lt, options).eval(&vars(vec![])).unwrap().into_value(), Some(Value::Bool(true))));
    assert!(matches!(program(gt, options).eval(&vars(vec![])).unwrap().into_value(), Some(Value::Bool(false))));
    assert!(matches!(program(eq, options).eval(&vars(vec![])).unwrap().into_value(), Some(Value::Bool(false))));
}

#[test]
fn nan_is_never_less_than_or_equal_to_anything() {
    let nan = const_double(f64::NAN);
    let lt = call("_<_", &["less_than"], vec![nan, const_double(1.0)]);
    let p = program(lt, EvalOptions::default());
    let v = p.eval(&vars(vec![])).unwrap().into_value().unwrap();
    assert!(matches!(v, Value::Bool(false)));

    let nan_a = const_double(f64::NAN);
    let nan_b = const_double(f64::NAN);
    let eq = call("_==_", &["equals"], vec![nan_a, nan_b]);
    let v = program(eq, EvalOptions::default()).eval(&vars(vec![])).unwrap().into_value().unwrap();
    assert!(matches!(v, Value::Bool(false)));
}

#[test]
fn utf8_size_counts_scalar_values_bytes_counts_encoded_length() {
    let emoji_size = call("size", &["size_string"], vec![const_str("\u{1F600}")]);
    let v = program(emoji_size, EvalOptions::default()).eval(&vars(vec![])).unwrap().into_value().unwrap();
    assert!(matches!(v, Value::Int(1)));

    let abc_size = call("size", &["size_string"], vec![const_str("abc")]);
    let v = program(abc_size, EvalOptions::default()).eval(&vars(vec![])).unwrap().into_value().unwrap();
    assert!(matches!(v, Value::Int(3)));

    let bytes_expr = call("bytes", &["bytes_string"], vec![const_str("\u{1F600}")]);
    let bytes_size = call("size", &["size_bytes"], vec![bytes_expr]);
    let v = program(bytes_size, EvalOptions::default()).eval(&vars(vec![])).unwrap().into_value().unwrap();
    assert!(matches!(v, Value::Int(4)));
}

#[test]
fn dereferencing_an_unknown_attribute_yields_that_attribute_in_the_unknown_set() {
    let expr = select(ident("request"), "id");
    let options = EvalOptions { enable_unknown_tracking: true, ..EvalOptions::default() };
    let p = program_with_unknowns(expr, options, &["request.*"]);
    match p.eval(&vars(vec![])).unwrap() {
        EvalOutcome::Unknown(u) => assert!(u.attributes().contains(&attr("request", &["id"]))),
        other => panic!("expected unknown, got {other:?}"),
    }
}

#[test]
fn and_of_two_unknown_booleans_merges_their_unknown_sets() {
    let left = select(ident("a"), "flag");
    let right = select(ident("b"), "flag");
    let expr = logical_and(left, right);
    let options = EvalOptions { enable_unknown_tracking: true, ..EvalOptions::default() };
    let p = program_with_unknowns(expr, options, &["a.*", "b.*"]);
    match p.eval(&vars(vec![])).unwrap() {
        EvalOutcome::Unknown(u) => {
            assert!(u.attributes().contains(&attr("a", &["flag"])));
            assert!(u.attributes().contains(&attr("b", &["flag"])));
        }
        other => panic!("expected unknown, got {other:?}"),
    }
}

#[test]
fn comprehension_skips_the_step_when_loop_condition_is_unknown() {
    // loop_condition is unknown on every iteration (never a concrete bool),
    // so loop_step — a division by zero that would otherwise surface as an
    // error — must never run; the accumulator stays at its initial value.
    let range = list(vec![const_int(1), const_int(2), const_int(3)]);
    let always_unknown = select(ident("u"), "flag");
    let erroring_step = call("_/_", &["divide_int64_int64"], vec![const_int(1), const_int(0)]);
    let expr = comprehension("x", range, "__result__", const_int(0), always_unknown, erroring_step, ident("__result__"));
    let options = EvalOptions { enable_unknown_tracking: true, ..EvalOptions::default() };
    let p = program_with_unknowns(expr, options, &["u.*"]);
    let v = p.eval(&vars(vec![])).unwrap().into_value().unwrap();
    assert!(matches!(v, Value::Int(0)));
}

fn exists_over_range(n: i64, budget: i64) -> cel_runtime::Program<cel_runtime::EmptyTypeProvider> {
    let items: Vec<_> = (0..n).map(const_int).collect();
    let predicate = call("_==_", &["equals"], vec![ident("x"), const_int(n - 1)]);
    let loop_step = logical_or(ident("__result__"), predicate);
    let expr = comprehension("x", list(items), "__result__", const_bool(false), const_bool(true), loop_step, ident("__result__"));
    let options = EvalOptions { comprehension_max_iterations: budget, ..EvalOptions::default() };
    program(expr, options)
}

#[test]
fn iteration_budget_one_short_of_range_length_fails() {
    let p = exists_over_range(10, 9);
    let err = p.eval(&vars(vec![])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::IterationBudgetExceeded);
}

#[test]
fn iteration_budget_matching_range_length_succeeds() {
    let p = exists_over_range(10, 10);
    let v = p.eval(&vars(vec![])).unwrap().into_value().unwrap();
    assert!(matches!(v, Value::Bool(true)));
}

#[test]
fn map_keys_are_yielded_in_literal_insertion_order() {
    let m = map_literal(vec![(const_str("z"), const_int(1)), (const_str("a"), const_int(2)), (const_str("m"), const_int(3))]);
    let expr = comprehension(
        "k",
        m,
        "__result__",
        list(vec![]),
        const_bool(true),
        call("add_list_list", &["add_list_list"], vec![ident("__result__"), list(vec![ident("k")])]),
        ident("__result__"),
    );
    let p = program(expr, EvalOptions::default());
    let v = p.eval(&vars(vec![])).unwrap().into_value().unwrap();
    match v {
        Value::List(items) => {
            let keys: Vec<String> = items.iter().map(|v| match v {
                Value::String(s) => s.to_string(),
                other => panic!("expected string key, got {other:?}"),
            }).collect();
            assert_eq!(keys, vec!["z", "a", "m"]);
        }
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn lazy_bind_evaluates_its_bound_expression_exactly_once() {
    use std::{cell::Cell, rc::Rc as StdRc};

    thread_local! {
        static CALLS: Cell<u32> = const { Cell::new(0) };
    }
    CALLS.with(|c| c.set(0));

    // `cel.bind(x, expensive(), x + x)`: the binding's body is an
    // identity call wrapping a marker the lazy-thunk machinery forces at
    // most once; a second reference must hit the forced cache instead of
    // re-evaluating.
    let expensive = call("expensive", &["expensive"], vec![]);
    let body = call("_+_", &["add_int64_int64"], vec![ident("x"), ident("x")]);
    let bind = comprehension("#unused", list(vec![]), "x", expensive, const_bool(false), const_bool(false), body);

    let mut dispatcher = cel_runtime::stdlib::build(EvalOptions::default());
    dispatcher
        .add_overload(
            "expensive",
            cel_runtime::Overload {
                arg_types: vec![],
                strict: true,
                implementation: StdRc::new(|_args| {
                    CALLS.with(|c| c.set(c.get() + 1));
                    Ok(Value::Int(21))
                }),
            },
        )
        .unwrap();
    let p = cel_runtime::Program::new(bind, dispatcher, cel_runtime::EmptyTypeProvider, Vec::new(), EvalOptions::default());
    let v = p.eval(&vars(vec![])).unwrap().into_value().unwrap();
    assert!(matches!(v, Value::Int(42)));
    assert_eq!(CALLS.with(|c| c.get()), 1);
}
