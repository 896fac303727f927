//! Symbolic attribute paths and unknown-attribute patterns (spec §4.A).
//!
//! An [`Attribute`] names the sequence of selections used to compute a
//! sub-result: an identifier followed by field/index qualifiers. An
//! [`AttributePattern`] is the same shape but may contain a [`Qualifier::Wildcard`]
//! and is only ever produced by [`AttributePattern::parse`] — never by
//! `qualify`, which only ever appends concrete qualifiers.

use std::fmt;

use crate::error::EvalError;

/// A single step in an attribute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(std::rc::Rc<str>),
    /// Matches any qualifier at this position. Only legal inside
    /// [`AttributePattern`]; never appears in a tracked [`Attribute`].
    Wildcard,
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Bool(b) => write!(f, "{b}"),
            Qualifier::Int(i) => write!(f, "{i}"),
            Qualifier::Uint(u) => write!(f, "{u}"),
            Qualifier::String(s) => write!(f, "{s}"),
            Qualifier::Wildcard => write!(f, "*"),
        }
    }
}

/// A wildcard-free symbolic path, e.g. `request.user.id`.
///
/// Produced during interpretation as sub-results are computed; compared
/// against [`AttributePattern`]s supplied by the resolver to detect unknowns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    root: std::rc::Rc<str>,
    qualifiers: Vec<Qualifier>,
}

impl Attribute {
    pub fn from_identifier(name: impl Into<std::rc::Rc<str>>) -> Self {
        Self { root: name.into(), qualifiers: Vec::new() }
    }

    /// Splits a dotted identifier chain (`"a.b.c"`) into three string
    /// qualifiers rooted at `a`.
    pub fn from_qualified_identifier(text: &str) -> Self {
        let mut parts = text.split('.');
        let root = parts.next().unwrap_or_default();
        let mut attr = Self::from_identifier(root);
        for part in parts {
            attr.qualifiers.push(Qualifier::String(std::rc::Rc::from(part)));
        }
        attr
    }

    /// Returns a new attribute with `q` appended. Qualifying with a wildcard
    /// is not representable: the caller must supply a concrete qualifier.
    #[must_use]
    pub fn qualify(&self, q: Qualifier) -> Self {
        debug_assert!(!matches!(q, Qualifier::Wildcard), "tracked attributes cannot contain wildcards");
        let mut qualifiers = self.qualifiers.clone();
        qualifiers.push(q);
        Self { root: self.root.clone(), qualifiers }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for q in &self.qualifiers {
            write!(f, ".{q}")?;
        }
        Ok(())
    }
}

/// A possibly-wildcarded attribute path used to declare which inputs a
/// resolver treats as unknown. Constructed only via [`AttributePattern::parse`]
/// or [`AttributePattern::from_identifier`]; never by qualifying an
/// [`Attribute`] (that invariant lives on the `Attribute` side).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePattern {
    root: std::rc::Rc<str>,
    qualifiers: Vec<Qualifier>,
}

impl AttributePattern {
    pub fn from_identifier(name: impl Into<std::rc::Rc<str>>) -> Self {
        Self { root: name.into(), qualifiers: Vec::new() }
    }

    /// Parses CEL selector syntax extended with a trailing `.*` wildcard
    /// segment, e.g. `request.headers.*` or `request.user.id`.
    ///
    /// Implementation note (spec §4.A): `*` is not valid in the underlying
    /// CEL identifier grammar, so it is escaped to a sentinel token before
    /// splitting on `.` and re-emitted as [`Qualifier::Wildcard`] afterward,
    /// rather than special-cased inside a hand-rolled selector lexer.
    pub fn parse(text: &str) -> Result<Self, EvalError> {
        if text.is_empty() {
            return Err(EvalError::invalid_argument("empty attribute pattern"));
        }
        const WILDCARD_SENTINEL: &str = "\u{0}WILDCARD\u{0}";
        let escaped = text.replace('*', WILDCARD_SENTINEL);
        let mut parts = escaped.split('.');
        let root_raw = parts.next().unwrap();
        if root_raw.is_empty() || root_raw == WILDCARD_SENTINEL {
            return Err(EvalError::invalid_argument(format!("invalid attribute pattern root: {text}")));
        }
        let root: std::rc::Rc<str> = std::rc::Rc::from(root_raw);
        let mut qualifiers = Vec::new();
        for part in parts {
            if part.is_empty() {
                return Err(EvalError::invalid_argument(format!("invalid attribute pattern: {text}")));
            }
            if part == WILDCARD_SENTINEL {
                qualifiers.push(Qualifier::Wildcard);
            } else if let Ok(i) = part.parse::<i64>() {
                qualifiers.push(Qualifier::Int(i));
            } else {
                qualifiers.push(Qualifier::String(std::rc::Rc::from(part)));
            }
        }
        Ok(Self { root, qualifiers })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// A pattern matches an attribute iff the pattern is a prefix of the
    /// attribute and every non-wildcard qualifier equals the attribute's
    /// qualifier at that position.
    pub fn matches(&self, attr: &Attribute) -> bool {
        if self.root.as_ref() != attr.root() {
            return false;
        }
        if self.qualifiers.len() > attr.qualifiers().len() {
            return false;
        }
        self.qualifiers.iter().zip(attr.qualifiers()).all(|(pat_q, attr_q)| match pat_q {
            Qualifier::Wildcard => true,
            other => other == attr_q,
        })
    }
}

impl fmt::Display for AttributePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for q in &self.qualifiers {
            write!(f, ".{q}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_appends() {
        let a = Attribute::from_identifier("request").qualify(Qualifier::String(std::rc::Rc::from("user")));
        assert_eq!(a.to_string(), "request.user");
    }

    #[test]
    fn from_qualified_identifier_splits_on_dot() {
        let a = Attribute::from_qualified_identifier("a.b.c");
        assert_eq!(a.root(), "a");
        assert_eq!(a.qualifiers().len(), 2);
    }

    #[test]
    fn wildcard_pattern_matches_prefix() {
        let pat = AttributePattern::parse("request.*").unwrap();
        let attr = Attribute::from_identifier("request")
            .qualify(Qualifier::String(std::rc::Rc::from("user")))
            .qualify(Qualifier::String(std::rc::Rc::from("id")));
        assert!(pat.matches(&attr));
    }

    #[test]
    fn exact_pattern_requires_full_prefix_match() {
        let pat = AttributePattern::parse("request.user.id").unwrap();
        let attr = Attribute::from_identifier("request").qualify(Qualifier::String(std::rc::Rc::from("user")));
        assert!(!pat.matches(&attr));
    }

    #[test]
    fn mismatched_root_never_matches() {
        let pat = AttributePattern::parse("request.*").unwrap();
        let attr = Attribute::from_identifier("response");
        assert!(!pat.matches(&attr));
    }

    #[test]
    fn invalid_pattern_is_invalid_argument() {
        let err = AttributePattern::parse("").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidArgument);
    }
}
