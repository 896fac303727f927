//! Regex match support (spec §4.E).
//!
//! CEL's `matches` function documents RE2 semantics (linear time, no
//! backtracking); the `regex` crate's engine provides exactly that
//! guarantee, so no backtracking regex engine is ever reached for in this
//! crate.

use crate::error::{EvalError, EvalResult};

pub fn compile(pattern: &str) -> EvalResult<regex::Regex> {
    regex::Regex::new(pattern).map_err(|e| EvalError::invalid_argument(format!("invalid regex: {e}")))
}

pub fn matches(text: &str, pattern: &str) -> EvalResult<bool> {
    Ok(compile(pattern)?.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_basic_pattern() {
        assert!(matches("hello world", "wor.d").unwrap());
        assert!(!matches("hello world", "^wor.d$").unwrap());
    }

    #[test]
    fn invalid_pattern_is_invalid_argument() {
        let err = matches("x", "(").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidArgument);
    }
}
