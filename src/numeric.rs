//! Numeric runtime helpers: integer arithmetic with overflow detection,
//! double arithmetic, and heterogeneous numeric comparison (spec §4.E).

use std::cmp::Ordering;

use crate::{
    error::{EvalError, EvalResult},
    value::Value,
};

/// Adds two signed integers, raising `numeric_overflow` when
/// `error_on_int_wrap` is set and wrapping otherwise.
pub fn add_int(a: i64, b: i64, error_on_wrap: bool) -> EvalResult<i64> {
    if error_on_wrap {
        a.checked_add(b).ok_or_else(|| EvalError::numeric_overflow("integer overflow in addition"))
    } else {
        Ok(a.wrapping_add(b))
    }
}

pub fn sub_int(a: i64, b: i64, error_on_wrap: bool) -> EvalResult<i64> {
    if error_on_wrap {
        a.checked_sub(b).ok_or_else(|| EvalError::numeric_overflow("integer overflow in subtraction"))
    } else {
        Ok(a.wrapping_sub(b))
    }
}

pub fn mul_int(a: i64, b: i64, error_on_wrap: bool) -> EvalResult<i64> {
    if error_on_wrap {
        a.checked_mul(b).ok_or_else(|| EvalError::numeric_overflow("integer overflow in multiplication"))
    } else {
        Ok(a.wrapping_mul(b))
    }
}

pub fn div_int(a: i64, b: i64, error_on_wrap: bool) -> EvalResult<i64> {
    if b == 0 {
        return Err(EvalError::divide_by_zero());
    }
    if error_on_wrap {
        a.checked_div(b).ok_or_else(|| EvalError::numeric_overflow("integer overflow in division"))
    } else {
        Ok(a.wrapping_div(b))
    }
}

pub fn mod_int(a: i64, b: i64) -> EvalResult<i64> {
    if b == 0 {
        return Err(EvalError::divide_by_zero());
    }
    Ok(a.wrapping_rem(b))
}

/// Negates `a`; negating `i64::MIN` overflows regardless of the wrap option,
/// since there is no positive representation (spec §4.E).
pub fn negate_int(a: i64) -> EvalResult<i64> {
    a.checked_neg().ok_or_else(|| EvalError::numeric_overflow("negation of minimum int overflows"))
}

pub fn add_uint(a: u64, b: u64, error_on_wrap: bool) -> EvalResult<u64> {
    if error_on_wrap {
        a.checked_add(b).ok_or_else(|| EvalError::numeric_overflow("unsigned overflow in addition"))
    } else {
        Ok(a.wrapping_add(b))
    }
}

pub fn sub_uint(a: u64, b: u64, error_on_wrap: bool) -> EvalResult<u64> {
    if error_on_wrap {
        a.checked_sub(b).ok_or_else(|| EvalError::numeric_overflow("unsigned overflow in subtraction"))
    } else {
        Ok(a.wrapping_sub(b))
    }
}

pub fn mul_uint(a: u64, b: u64, error_on_wrap: bool) -> EvalResult<u64> {
    if error_on_wrap {
        a.checked_mul(b).ok_or_else(|| EvalError::numeric_overflow("unsigned overflow in multiplication"))
    } else {
        Ok(a.wrapping_mul(b))
    }
}

pub fn div_uint(a: u64, b: u64) -> EvalResult<u64> {
    if b == 0 {
        return Err(EvalError::divide_by_zero());
    }
    Ok(a / b)
}

pub fn mod_uint(a: u64, b: u64) -> EvalResult<u64> {
    if b == 0 {
        return Err(EvalError::divide_by_zero());
    }
    Ok(a % b)
}

/// Exact mathematical order between int, uint, and double values, following
/// spec §4.E: NaN compares equal to nothing and is neither less than nor
/// greater than any number (spec §9 fixes this explicitly, resolving an
/// ambiguity in the source material).
pub fn heterogeneous_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Uint(a), Value::Uint(b)) => Some(a.cmp(b)),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        (Value::Int(i), Value::Uint(u)) => Some(cmp_int_uint(*i, *u)),
        (Value::Uint(u), Value::Int(i)) => Some(cmp_int_uint(*i, *u).reverse()),
        (Value::Int(i), Value::Double(d)) => cmp_int_double(*i, *d),
        (Value::Double(d), Value::Int(i)) => cmp_int_double(*i, *d).map(Ordering::reverse),
        (Value::Uint(u), Value::Double(d)) => cmp_uint_double(*u, *d),
        (Value::Double(d), Value::Uint(u)) => cmp_uint_double(*u, *d).map(Ordering::reverse),
        _ => None,
    }
}

fn cmp_int_uint(i: i64, u: u64) -> Ordering {
    if i < 0 {
        Ordering::Less
    } else {
        (i as u64).cmp(&u)
    }
}

fn cmp_int_double(i: i64, d: f64) -> Option<Ordering> {
    if d.is_nan() {
        return None;
    }
    (i as f64).partial_cmp(&d)
}

fn cmp_uint_double(u: u64, d: f64) -> Option<Ordering> {
    if d.is_nan() {
        return None;
    }
    (u as f64).partial_cmp(&d)
}
