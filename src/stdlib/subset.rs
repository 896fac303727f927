//! Standard-function subsetting (spec §4.G): callers choose exactly one of
//! an include-list, an exclude-list, or a predicate filter; mixing is a
//! configuration error, enforced here by representing the choice as an enum
//! rather than three independent fields.

use std::{collections::HashSet, rc::Rc};

pub enum FunctionFilter {
    All,
    Include(HashSet<String>),
    Exclude(HashSet<String>),
    Predicate(Rc<dyn Fn(&str) -> bool>),
}

impl FunctionFilter {
    pub fn include(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Include(names.into_iter().map(Into::into).collect())
    }

    pub fn exclude(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Exclude(names.into_iter().map(Into::into).collect())
    }

    pub fn predicate(f: impl Fn(&str) -> bool + 'static) -> Self {
        Self::Predicate(Rc::new(f))
    }

    pub fn allows(&self, function_name: &str) -> bool {
        match self {
            FunctionFilter::All => true,
            FunctionFilter::Include(names) => names.contains(function_name),
            FunctionFilter::Exclude(names) => !names.contains(function_name),
            FunctionFilter::Predicate(f) => f(function_name),
        }
    }
}
