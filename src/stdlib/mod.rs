//! The standard function catalog (spec §4.G).
//!
//! A named catalog grouping overloads into functions (`add`, `size`,
//! `matches`, `timestamp`, `getDayOfWeek`, `less_equals`, …); each function
//! materializes its overload ids into [`Dispatcher`] bindings at
//! program-build time as a function of [`EvalOptions`]. Grounded on the
//! teacher's `builtins` module, which performs the analogous binding of
//! Python dunder names to primitive implementations at interpreter-init
//! time.

pub mod subset;

use std::{cmp::Ordering, rc::Rc};

use crate::{
    dispatcher::{predicates, Dispatcher, Overload},
    equality, listmap, numeric, regexp,
    error::{EvalError, EvalResult},
    options::EvalOptions,
    strings, time,
    value::{Duration, Timestamp, Value},
};

use subset::FunctionFilter;

/// Builds a dispatcher with every standard function bound, configured by
/// `options` (e.g. the signed/unsigned overload variants `unsigned_longs`
/// selects between).
pub fn build(options: EvalOptions) -> Dispatcher {
    build_filtered(options, &FunctionFilter::All)
}

/// As [`build`], but only registers the functions `filter` allows (spec
/// §4.G "Subsetting").
pub fn build_filtered(options: EvalOptions, filter: &FunctionFilter) -> Dispatcher {
    let mut d = Dispatcher::new();
    let mut add = |name: &str, overload_id: &str, overload: Overload| {
        if filter.allows(name) {
            d.add_overload(overload_id, overload).expect("standard library overload ids are unique");
        }
    };

    register_arithmetic(&mut add, options);
    register_comparison(&mut add, options);
    register_logical(&mut add);
    register_size(&mut add);
    register_strings(&mut add);
    register_conversions(&mut add);
    register_time(&mut add);
    register_collections(&mut add);

    d
}

fn strict(arg_types: Vec<crate::dispatcher::ArgTypePredicate>, f: impl Fn(&[Value]) -> EvalResult<Value> + 'static) -> Overload {
    Overload { arg_types, strict: true, implementation: Rc::new(f) }
}

fn as_int(v: &Value) -> i64 {
    match v {
        Value::Int(i) => *i,
        _ => unreachable!("guarded by dispatcher arg-type predicate"),
    }
}
fn as_uint(v: &Value) -> u64 {
    match v {
        Value::Uint(u) => *u,
        _ => unreachable!("guarded by dispatcher arg-type predicate"),
    }
}
fn as_double(v: &Value) -> f64 {
    match v {
        Value::Double(d) => *d,
        _ => unreachable!("guarded by dispatcher arg-type predicate"),
    }
}
fn as_str(v: &Value) -> &str {
    match v {
        Value::String(s) => s,
        _ => unreachable!("guarded by dispatcher arg-type predicate"),
    }
}
fn as_bytes(v: &Value) -> &[u8] {
    match v {
        Value::Bytes(b) => b,
        _ => unreachable!("guarded by dispatcher arg-type predicate"),
    }
}
fn as_duration(v: &Value) -> Duration {
    match v {
        Value::Duration(d) => *d,
        _ => unreachable!("guarded by dispatcher arg-type predicate"),
    }
}
fn as_timestamp(v: &Value) -> Timestamp {
    match v {
        Value::Timestamp(t) => *t,
        _ => unreachable!("guarded by dispatcher arg-type predicate"),
    }
}

type Register<'a> = dyn FnMut(&str, &str, Overload) + 'a;

fn register_arithmetic(add: &mut Register, opts: EvalOptions) {
    let wrap = opts.error_on_int_wrap;
    add(
        "add",
        "add_int64_int64",
        strict(vec![predicates::is_int, predicates::is_int], move |a| {
            numeric::add_int(as_int(&a[0]), as_int(&a[1]), wrap).map(Value::Int)
        }),
    );
    add(
        "add",
        "add_uint64_uint64",
        strict(vec![predicates::is_uint, predicates::is_uint], move |a| {
            numeric::add_uint(as_uint(&a[0]), as_uint(&a[1]), wrap).map(Value::Uint)
        }),
    );
    add(
        "add",
        "add_double_double",
        strict(vec![predicates::is_double, predicates::is_double], |a| {
            Ok(Value::Double(as_double(&a[0]) + as_double(&a[1])))
        }),
    );
    add(
        "add",
        "add_string_string",
        strict(vec![predicates::is_string, predicates::is_string], |a| {
            Ok(Value::string(strings::concat_str(as_str(&a[0]), as_str(&a[1]))))
        }),
    );
    add(
        "add",
        "add_bytes_bytes",
        strict(vec![predicates::is_bytes, predicates::is_bytes], |a| {
            Ok(Value::bytes(strings::concat_bytes(as_bytes(&a[0]), as_bytes(&a[1]))))
        }),
    );
    add(
        "add",
        "add_list_list",
        strict(vec![predicates::is_list, predicates::is_list], |a| match (&a[0], &a[1]) {
            (Value::List(x), Value::List(y)) => Ok(Value::list(listmap::concat_list(x, y))),
            _ => unreachable!(),
        }),
    );
    add(
        "add",
        "add_timestamp_duration",
        strict(vec![predicates::is_timestamp, predicates::is_duration], |a| {
            time::add_timestamp_duration(as_timestamp(&a[0]), as_duration(&a[1])).map(Value::Timestamp)
        }),
    );
    add(
        "add",
        "add_duration_duration",
        strict(vec![predicates::is_duration, predicates::is_duration], |a| {
            time::add_duration(as_duration(&a[0]), as_duration(&a[1])).map(Value::Duration)
        }),
    );

    add(
        "subtract",
        "subtract_int64_int64",
        strict(vec![predicates::is_int, predicates::is_int], move |a| {
            numeric::sub_int(as_int(&a[0]), as_int(&a[1]), wrap).map(Value::Int)
        }),
    );
    add(
        "subtract",
        "subtract_uint64_uint64",
        strict(vec![predicates::is_uint, predicates::is_uint], move |a| {
            numeric::sub_uint(as_uint(&a[0]), as_uint(&a[1]), wrap).map(Value::Uint)
        }),
    );
    add(
        "subtract",
        "subtract_double_double",
        strict(vec![predicates::is_double, predicates::is_double], |a| {
            Ok(Value::Double(as_double(&a[0]) - as_double(&a[1])))
        }),
    );
    add(
        "subtract",
        "subtract_timestamp_duration",
        strict(vec![predicates::is_timestamp, predicates::is_duration], |a| {
            time::sub_timestamp_duration(as_timestamp(&a[0]), as_duration(&a[1])).map(Value::Timestamp)
        }),
    );
    add(
        "subtract",
        "subtract_timestamp_timestamp",
        strict(vec![predicates::is_timestamp, predicates::is_timestamp], |a| {
            time::sub_timestamp_timestamp(as_timestamp(&a[0]), as_timestamp(&a[1])).map(Value::Duration)
        }),
    );
    add(
        "subtract",
        "subtract_duration_duration",
        strict(vec![predicates::is_duration, predicates::is_duration], |a| {
            time::sub_duration(as_duration(&a[0]), as_duration(&a[1])).map(Value::Duration)
        }),
    );

    add(
        "multiply",
        "multiply_int64_int64",
        strict(vec![predicates::is_int, predicates::is_int], move |a| {
            numeric::mul_int(as_int(&a[0]), as_int(&a[1]), wrap).map(Value::Int)
        }),
    );
    add(
        "multiply",
        "multiply_uint64_uint64",
        strict(vec![predicates::is_uint, predicates::is_uint], move |a| {
            numeric::mul_uint(as_uint(&a[0]), as_uint(&a[1]), wrap).map(Value::Uint)
        }),
    );
    add(
        "multiply",
        "multiply_double_double",
        strict(vec![predicates::is_double, predicates::is_double], |a| {
            Ok(Value::Double(as_double(&a[0]) * as_double(&a[1])))
        }),
    );

    add(
        "divide",
        "divide_int64_int64",
        strict(vec![predicates::is_int, predicates::is_int], move |a| {
            numeric::div_int(as_int(&a[0]), as_int(&a[1]), wrap).map(Value::Int)
        }),
    );
    add(
        "divide",
        "divide_uint64_uint64",
        strict(vec![predicates::is_uint, predicates::is_uint], |a| {
            numeric::div_uint(as_uint(&a[0]), as_uint(&a[1])).map(Value::Uint)
        }),
    );
    add(
        "divide",
        "divide_double_double",
        strict(vec![predicates::is_double, predicates::is_double], |a| {
            Ok(Value::Double(as_double(&a[0]) / as_double(&a[1])))
        }),
    );

    add(
        "modulo",
        "modulo_int64_int64",
        strict(vec![predicates::is_int, predicates::is_int], |a| numeric::mod_int(as_int(&a[0]), as_int(&a[1])).map(Value::Int)),
    );
    add(
        "modulo",
        "modulo_uint64_uint64",
        strict(vec![predicates::is_uint, predicates::is_uint], |a| {
            numeric::mod_uint(as_uint(&a[0]), as_uint(&a[1])).map(Value::Uint)
        }),
    );

    add("negate", "negate_int64", strict(vec![predicates::is_int], |a| numeric::negate_int(as_int(&a[0])).map(Value::Int)));
    add("negate", "negate_double", strict(vec![predicates::is_double], |a| Ok(Value::Double(-as_double(&a[0])))));
}

/// Orders two comparable values, treating NaN involvement as "unordered"
/// (`Ok(None)`, not an error — CEL's relational operators return `false` for
/// any NaN comparison) and type mismatches as `invalid_argument`.
fn comparable_order(a: &Value, b: &Value) -> EvalResult<Option<Ordering>> {
    match (a, b) {
        (Value::Int(_) | Value::Uint(_) | Value::Double(_), Value::Int(_) | Value::Uint(_) | Value::Double(_)) => {
            Ok(numeric::heterogeneous_cmp(a, b))
        }
        (Value::String(x), Value::String(y)) => Ok(Some(x.cmp(y))),
        (Value::Bytes(x), Value::Bytes(y)) => Ok(Some(strings::bytes_cmp(x, y))),
        (Value::Bool(x), Value::Bool(y)) => Ok(Some(x.cmp(y))),
        (Value::Duration(x), Value::Duration(y)) => Ok(Some((x.seconds, x.nanos).cmp(&(y.seconds, y.nanos)))),
        (Value::Timestamp(x), Value::Timestamp(y)) => Ok(Some((x.seconds, x.nanos).cmp(&(y.seconds, y.nanos)))),
        _ => Err(EvalError::invalid_argument(format!("cannot compare {} and {}", a.type_value(), b.type_value()))),
    }
}

/// Rejects a mixed int/uint/double pair when cross-type numeric comparisons
/// are disabled (spec §3): `1 < 2u` has no overload in that configuration,
/// the same as any other unmatched call.
fn numeric_types_match(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(_), Value::Int(_)) | (Value::Uint(_), Value::Uint(_)) | (Value::Double(_), Value::Double(_)) => true,
        (Value::Int(_) | Value::Uint(_) | Value::Double(_), Value::Int(_) | Value::Uint(_) | Value::Double(_)) => false,
        _ => true,
    }
}

fn register_comparison(add: &mut Register, opts: EvalOptions) {
    let hetero = opts.enable_heterogeneous_numeric_comparisons;
    let guard = move |function: &'static str, a: &Value, b: &Value| -> EvalResult<()> {
        if !hetero && !numeric_types_match(a, b) {
            return Err(EvalError::overload_not_found(function));
        }
        Ok(())
    };
    add(
        "less_than",
        "less_than",
        strict(vec![predicates::any, predicates::any], move |a| {
            guard("less_than", &a[0], &a[1])?;
            Ok(Value::Bool(comparable_order(&a[0], &a[1])?.is_some_and(|o| o == Ordering::Less)))
        }),
    );
    add(
        "less_equals",
        "less_equals",
        strict(vec![predicates::any, predicates::any], move |a| {
            guard("less_equals", &a[0], &a[1])?;
            Ok(Value::Bool(comparable_order(&a[0], &a[1])?.is_some_and(|o| o != Ordering::Greater)))
        }),
    );
    add(
        "greater_than",
        "greater_than",
        strict(vec![predicates::any, predicates::any], move |a| {
            guard("greater_than", &a[0], &a[1])?;
            Ok(Value::Bool(comparable_order(&a[0], &a[1])?.is_some_and(|o| o == Ordering::Greater)))
        }),
    );
    add(
        "greater_equals",
        "greater_equals",
        strict(vec![predicates::any, predicates::any], move |a| {
            guard("greater_equals", &a[0], &a[1])?;
            Ok(Value::Bool(comparable_order(&a[0], &a[1])?.is_some_and(|o| o != Ordering::Less)))
        }),
    );
    // Equality is unaffected: `1 == 2u` is always a well-typed `false`, not
    // an absent overload, regardless of the relational-comparison option.
    add(
        "equals",
        "equals",
        strict(vec![predicates::any, predicates::any], |a| Ok(Value::Bool(equality::equals(&a[0], &a[1])))),
    );
    add(
        "not_equals",
        "not_equals",
        strict(vec![predicates::any, predicates::any], |a| Ok(Value::Bool(!equality::equals(&a[0], &a[1])))),
    );
}

fn register_logical(add: &mut Register) {
    add("logical_not", "logical_not", strict(vec![predicates::is_bool], |a| match a[0] {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        _ => unreachable!(),
    }));
}

fn register_size(add: &mut Register) {
    add("size", "size_string", strict(vec![predicates::is_string], |a| Ok(Value::Int(strings::string_size(as_str(&a[0]))))));
    add("size", "size_bytes", strict(vec![predicates::is_bytes], |a| Ok(Value::Int(strings::bytes_size(as_bytes(&a[0]))))));
    add("size", "size_list", strict(vec![predicates::is_list], |a| match &a[0] {
        Value::List(items) => Ok(Value::Int(items.len() as i64)),
        _ => unreachable!(),
    }));
    add("size", "size_map", strict(vec![predicates::is_map], |a| match &a[0] {
        Value::Map(m) => Ok(Value::Int(m.len() as i64)),
        _ => unreachable!(),
    }));
}

fn register_strings(add: &mut Register) {
    add(
        "matches",
        "matches_string",
        strict(vec![predicates::is_string, predicates::is_string], |a| {
            regexp::matches(as_str(&a[0]), as_str(&a[1])).map(Value::Bool)
        }),
    );
    add(
        "contains",
        "contains_string",
        strict(vec![predicates::is_string, predicates::is_string], |a| Ok(Value::Bool(as_str(&a[0]).contains(as_str(&a[1]))))),
    );
    add(
        "startsWith",
        "starts_with_string",
        strict(vec![predicates::is_string, predicates::is_string], |a| {
            Ok(Value::Bool(as_str(&a[0]).starts_with(as_str(&a[1]))))
        }),
    );
    add(
        "endsWith",
        "ends_with_string",
        strict(vec![predicates::is_string, predicates::is_string], |a| Ok(Value::Bool(as_str(&a[0]).ends_with(as_str(&a[1]))))),
    );
}

fn register_conversions(add: &mut Register) {
    add("int", "int_int64", strict(vec![predicates::is_int], |a| Ok(a[0].clone())));
    add(
        "int",
        "int_uint64",
        strict(vec![predicates::is_uint], |a| {
            i64::try_from(as_uint(&a[0])).map(Value::Int).map_err(|_| EvalError::numeric_overflow("uint to int conversion"))
        }),
    );
    add("int", "int_double", strict(vec![predicates::is_double], |a| {
        let d = as_double(&a[0]);
        if !d.is_finite() || d < i64::MIN as f64 || d > i64::MAX as f64 {
            return Err(EvalError::numeric_overflow("double to int conversion"));
        }
        Ok(Value::Int(d as i64))
    }));
    add(
        "int",
        "int_string",
        strict(vec![predicates::is_string], |a| {
            as_str(&a[0]).parse::<i64>().map(Value::Int).map_err(|_| EvalError::bad_format(format!("invalid int: {}", as_str(&a[0]))))
        }),
    );

    add(
        "uint",
        "uint_uint64",
        strict(vec![predicates::is_uint], |a| Ok(a[0].clone())),
    );
    add(
        "uint",
        "uint_int64",
        strict(vec![predicates::is_int], |a| {
            u64::try_from(as_int(&a[0])).map(Value::Uint).map_err(|_| EvalError::numeric_overflow("int to uint conversion"))
        }),
    );
    add("uint", "uint_double", strict(vec![predicates::is_double], |a| {
        let d = as_double(&a[0]);
        if !d.is_finite() || d < 0.0 || d > u64::MAX as f64 {
            return Err(EvalError::numeric_overflow("double to uint conversion"));
        }
        Ok(Value::Uint(d as u64))
    }));
    add(
        "uint",
        "uint_string",
        strict(vec![predicates::is_string], |a| {
            as_str(&a[0]).parse::<u64>().map(Value::Uint).map_err(|_| EvalError::bad_format(format!("invalid uint: {}", as_str(&a[0]))))
        }),
    );

    add("double", "double_double", strict(vec![predicates::is_double], |a| Ok(a[0].clone())));
    add("double", "double_int64", strict(vec![predicates::is_int], |a| Ok(Value::Double(as_int(&a[0]) as f64))));
    add("double", "double_uint64", strict(vec![predicates::is_uint], |a| Ok(Value::Double(as_uint(&a[0]) as f64))));
    add(
        "double",
        "double_string",
        strict(vec![predicates::is_string], |a| {
            as_str(&a[0]).parse::<f64>().map(Value::Double).map_err(|_| EvalError::bad_format(format!("invalid double: {}", as_str(&a[0]))))
        }),
    );

    add("string", "string_string", strict(vec![predicates::is_string], |a| Ok(a[0].clone())));
    add("string", "string_int64", strict(vec![predicates::is_int], |a| Ok(Value::string(as_int(&a[0]).to_string()))));
    add("string", "string_uint64", strict(vec![predicates::is_uint], |a| Ok(Value::string(as_uint(&a[0]).to_string()))));
    add("string", "string_double", strict(vec![predicates::is_double], |a| Ok(Value::string(as_double(&a[0]).to_string()))));
    add("string", "string_bool", strict(vec![predicates::is_bool], |a| match a[0] {
        Value::Bool(b) => Ok(Value::string(b.to_string())),
        _ => unreachable!(),
    }));
    add(
        "string",
        "string_bytes",
        strict(vec![predicates::is_bytes], |a| {
            std::str::from_utf8(as_bytes(&a[0])).map(Value::string).map_err(|_| EvalError::bad_format("bytes are not valid UTF-8"))
        }),
    );
    add(
        "string",
        "string_timestamp",
        strict(vec![predicates::is_timestamp], |a| Ok(Value::string(time::format_timestamp(as_timestamp(&a[0]))))),
    );
    add(
        "string",
        "string_duration",
        strict(vec![predicates::is_duration], |a| Ok(Value::string(time::format_duration(as_duration(&a[0]))))),
    );

    add(
        "bytes",
        "bytes_string",
        strict(vec![predicates::is_string], |a| Ok(Value::bytes(as_str(&a[0]).as_bytes().to_vec()))),
    );
    add("bytes", "bytes_bytes", strict(vec![predicates::is_bytes], |a| Ok(a[0].clone())));
}

fn register_time(add: &mut Register) {
    add(
        "timestamp",
        "timestamp_string",
        strict(vec![predicates::is_string], |a| time::parse_timestamp(as_str(&a[0])).map(Value::Timestamp)),
    );
    add("timestamp", "timestamp_timestamp", strict(vec![predicates::is_timestamp], |a| Ok(a[0].clone())));
    add(
        "duration",
        "duration_string",
        strict(vec![predicates::is_string], |a| time::parse_duration(as_str(&a[0])).map(Value::Duration)),
    );
    add("duration", "duration_duration", strict(vec![predicates::is_duration], |a| Ok(a[0].clone())));

    macro_rules! timestamp_getter {
        ($fn_name:literal, $impl:path) => {
            add(
                $fn_name,
                concat!($fn_name, "_timestamp"),
                strict(vec![predicates::is_timestamp], |a| $impl(as_timestamp(&a[0]), None).map(Value::Int)),
            );
            add(
                $fn_name,
                concat!($fn_name, "_timestamp_string"),
                strict(vec![predicates::is_timestamp, predicates::is_string], |a| {
                    $impl(as_timestamp(&a[0]), Some(as_str(&a[1]))).map(Value::Int)
                }),
            );
        };
    }
    timestamp_getter!("getDayOfWeek", time::get_day_of_week);
    timestamp_getter!("getDayOfMonth", time::get_day_of_month);
    timestamp_getter!("getDayOfYear", time::get_day_of_year);
    timestamp_getter!("getMonth", time::get_month);
    timestamp_getter!("getFullYear", time::get_full_year);
    timestamp_getter!("getHours", time::get_hours);
    timestamp_getter!("getMinutes", time::get_minutes);
    timestamp_getter!("getSeconds", time::get_seconds);
    timestamp_getter!("getMilliseconds", time::get_milliseconds);

    add(
        "getHours",
        "get_hours_duration",
        strict(vec![predicates::is_duration], |a| Ok(Value::Int(time::duration_hours(as_duration(&a[0]))))),
    );
    add(
        "getMinutes",
        "get_minutes_duration",
        strict(vec![predicates::is_duration], |a| Ok(Value::Int(time::duration_minutes(as_duration(&a[0]))))),
    );
    add(
        "getSeconds",
        "get_seconds_duration",
        strict(vec![predicates::is_duration], |a| Ok(Value::Int(time::duration_seconds(as_duration(&a[0]))))),
    );
    add(
        "getMilliseconds",
        "get_milliseconds_duration",
        strict(vec![predicates::is_duration], |a| Ok(Value::Int(time::duration_milliseconds(as_duration(&a[0]))))),
    );
}

fn register_collections(add: &mut Register) {
    add(
        "index_list",
        "index_list",
        strict(vec![predicates::is_list, predicates::is_int], |a| match &a[0] {
            Value::List(items) => listmap::list_index(items, as_int(&a[1])),
            _ => unreachable!(),
        }),
    );
    add(
        "index_map",
        "index_map",
        strict(vec![predicates::is_map, predicates::any], |a| match &a[0] {
            Value::Map(m) => listmap::map_index(m, &a[1]),
            _ => unreachable!(),
        }),
    );
    add(
        "in",
        "in_list",
        strict(vec![predicates::any, predicates::is_list], |a| match &a[1] {
            Value::List(items) => Ok(Value::Bool(items.iter().any(|item| equality::equals(&a[0], item)))),
            _ => unreachable!(),
        }),
    );
    add(
        "in",
        "in_map",
        strict(vec![predicates::any, predicates::is_map], |a| match &a[1] {
            Value::Map(m) => {
                let key = listmap::value_to_map_key(&a[0])?;
                Ok(Value::Bool(m.contains_key(&key)))
            }
            _ => unreachable!(),
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn int_plus_int_dispatches() {
        let d = build(EvalOptions::default());
        let ids: Vec<Rc<str>> = vec![Rc::from("add_int64_int64")];
        let result = d.dispatch("add", &ids, &[Value::Int(1), Value::Int(2)]).unwrap();
        assert!(matches!(result, Value::Int(3)));
    }

    #[test]
    fn heterogeneous_less_than_int_double() {
        let d = build(EvalOptions::default());
        let ids: Vec<Rc<str>> = vec![Rc::from("less_than")];
        let result = d.dispatch("less_than", &ids, &[Value::Int(1), Value::Double(1.5)]).unwrap();
        assert!(matches!(result, Value::Bool(true)));
    }

    #[test]
    fn disabling_heterogeneous_comparisons_rejects_cross_type_relational() {
        let options = EvalOptions { enable_heterogeneous_numeric_comparisons: false, ..EvalOptions::default() };
        let d = build(options);
        let ids: Vec<Rc<str>> = vec![Rc::from("less_than")];
        let err = d.dispatch("less_than", &ids, &[Value::Int(1), Value::Uint(2)]).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::OverloadNotFound);
        // Same-type numeric comparisons are unaffected.
        let ids: Vec<Rc<str>> = vec![Rc::from("less_than")];
        let result = d.dispatch("less_than", &ids, &[Value::Int(1), Value::Int(2)]).unwrap();
        assert!(matches!(result, Value::Bool(true)));
    }

    #[test]
    fn disabling_heterogeneous_comparisons_leaves_equality_alone() {
        let options = EvalOptions { enable_heterogeneous_numeric_comparisons: false, ..EvalOptions::default() };
        let d = build(options);
        let ids: Vec<Rc<str>> = vec![Rc::from("equals")];
        let result = d.dispatch("equals", &ids, &[Value::Int(1), Value::Uint(1)]).unwrap();
        assert!(matches!(result, Value::Bool(true)));
    }

    #[test]
    fn subsetting_excludes_functions_not_allowed() {
        let filter = FunctionFilter::include(["size"]);
        let d = build_filtered(EvalOptions::default(), &filter);
        let ids: Vec<Rc<str>> = vec![Rc::from("add_int64_int64")];
        assert!(d.dispatch("add", &ids, &[Value::Int(1), Value::Int(2)]).is_err());
        let size_ids: Vec<Rc<str>> = vec![Rc::from("size_string")];
        assert!(d.dispatch("size", &size_ids, &[Value::string("hi")]).is_ok());
    }
}
