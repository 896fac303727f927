//! Evaluation error kinds and the error type surfaced by [`crate::Program::eval`].
//!
//! Mirrors the teacher crate's `ExcType`/`RunError` split: a small closed enum
//! of kinds (`strum`-derived `Display`/`EnumString`) paired with a single
//! concrete error struct that carries the kind plus context.

use strum::{Display, EnumString};

use crate::ast::ExprId;

/// Result type alias for operations that can produce an evaluation error.
pub type EvalResult<T> = Result<T, EvalError>;

/// The closed set of error kinds a checked CEL program can surface at
/// runtime (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ErrorKind {
    /// Wrong runtime type where the language admits only one.
    InvalidArgument,
    /// string→number, string→timestamp, string→duration parsing failure.
    BadFormat,
    /// Integer division or modulo by zero.
    DivideByZero,
    /// Signed/unsigned overflow, or duration/timestamp range overflow.
    NumericOverflow,
    /// List index out of `[0, len)`.
    IndexOutOfBounds,
    /// Field/key miss where `has`/`find` would return false.
    AttributeNotFound,
    /// Map literal key collision under `error_on_duplicate_map_keys`.
    DuplicateAttribute,
    /// Dispatcher could not select exactly one overload.
    OverloadNotFound,
    /// `type(x)` has no checked type for `x`.
    TypeNotFound,
    /// Per-evaluation comprehension iteration budget exceeded.
    IterationBudgetExceeded,
}

/// A source location attached to an evaluation error, identifying the
/// checked-AST node whose evaluation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub expr_id: ExprId,
}

impl SourceLocation {
    pub fn new(expr_id: ExprId) -> Self {
        Self { expr_id }
    }
}

/// A fully-formed evaluation error: kind, human-readable message, the
/// expression that raised it, and an optional wrapped cause (e.g. an error
/// propagated up through a dispatched function call).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct EvalError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub cause: Option<Box<EvalError>>,
}

impl EvalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), location: None, cause: None }
    }

    #[must_use]
    pub fn at(mut self, expr_id: ExprId) -> Self {
        if self.location.is_none() {
            self.location = Some(SourceLocation::new(expr_id));
        }
        self
    }

    #[must_use]
    pub fn caused_by(mut self, cause: EvalError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn bad_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadFormat, message)
    }

    pub fn divide_by_zero() -> Self {
        Self::new(ErrorKind::DivideByZero, "division by zero")
    }

    pub fn numeric_overflow(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NumericOverflow, message)
    }

    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        Self::new(ErrorKind::IndexOutOfBounds, format!("index {index} out of bounds for list of length {len}"))
    }

    pub fn attribute_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AttributeNotFound, message)
    }

    pub fn duplicate_attribute(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateAttribute, message)
    }

    pub fn overload_not_found(function: &str) -> Self {
        Self::new(ErrorKind::OverloadNotFound, format!("no matching overload for '{function}'"))
    }

    pub fn type_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeNotFound, message)
    }

    pub fn iteration_budget_exceeded() -> Self {
        Self::new(ErrorKind::IterationBudgetExceeded, "comprehension iteration budget exceeded")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = EvalError::divide_by_zero();
        assert_eq!(err.to_string(), "DivideByZero: division by zero");
    }

    #[test]
    fn at_sets_location_only_once() {
        let err = EvalError::divide_by_zero().at(ExprId::new(3)).at(ExprId::new(9));
        assert_eq!(err.location.unwrap().expr_id, ExprId::new(3));
    }
}
