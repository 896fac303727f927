//! Evaluator configuration (spec §3 "Options").
//!
//! A plain, immutable config struct threaded through program construction —
//! no process-wide singletons (spec §9 design notes).

/// One option per effect named in spec §3; `Copy` since the struct is tiny
/// and passed by value throughout the interpreter. `Serialize`/`Deserialize`
/// let a host load these from a config file alongside its own settings.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EvalOptions {
    /// Treat uint literals as a distinct type (on) vs. wrap into signed (off).
    pub unsigned_longs: bool,
    /// Signed/unsigned overflow raises `numeric_overflow` (on) vs. wraps (off).
    pub error_on_int_wrap: bool,
    /// Map literal with a repeated key raises `duplicate_attribute`.
    pub error_on_duplicate_map_keys: bool,
    /// Negative ⇒ unlimited; else exceed ⇒ `iteration_budget_exceeded`.
    pub comprehension_max_iterations: i64,
    /// If off, both branches of `&&`, `||`, `?:` are evaluated before
    /// selection (still error-preserving).
    pub enable_short_circuiting: bool,
    /// Enables cross-type `<`, `<=`, `>`, `>=` between int/uint/double.
    pub enable_heterogeneous_numeric_comparisons: bool,
    /// Required to use attribute-based unknowns; when off, the attribute
    /// field of every intermediate result stays empty.
    pub enable_unknown_tracking: bool,
    /// After a function dispatch, adapt well-known message wrappers back to
    /// primitives.
    pub unwrap_well_known_types_on_dispatch: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            unsigned_longs: true,
            error_on_int_wrap: true,
            error_on_duplicate_map_keys: false,
            comprehension_max_iterations: -1,
            enable_short_circuiting: true,
            enable_heterogeneous_numeric_comparisons: true,
            enable_unknown_tracking: false,
            unwrap_well_known_types_on_dispatch: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cel_go_cel_java_baseline() {
        let opts = EvalOptions::default();
        assert!(opts.unsigned_longs);
        assert!(opts.error_on_int_wrap);
        assert!(!opts.enable_unknown_tracking);
        assert_eq!(opts.comprehension_max_iterations, -1);
    }
}
