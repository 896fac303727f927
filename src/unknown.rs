//! Unknown-set accumulator (spec §4.B).

use std::collections::BTreeSet;

use crate::{ast::ExprId, attribute::Attribute};

/// Accumulates the expression ids and concrete attributes that evaluation
/// could not resolve. Invariant: attributes stored here are always
/// wildcard-free, since they come from [`Attribute`], never
/// [`crate::attribute::AttributePattern`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownSet {
    expr_ids: BTreeSet<ExprId>,
    attributes: Vec<Attribute>,
}

impl UnknownSet {
    pub fn of_expr_id(id: ExprId) -> Self {
        let mut expr_ids = BTreeSet::new();
        expr_ids.insert(id);
        Self { expr_ids, attributes: Vec::new() }
    }

    pub fn of_attribute(attr: Attribute) -> Self {
        Self { expr_ids: BTreeSet::new(), attributes: vec![attr] }
    }

    /// Set union on both the expression-id set and the attribute set.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.expr_ids.extend(other.expr_ids);
        for attr in other.attributes {
            if !self.attributes.contains(&attr) {
                self.attributes.push(attr);
            }
        }
        self
    }

    pub fn merge_ref(&mut self, other: &Self) {
        self.expr_ids.extend(other.expr_ids.iter().copied());
        for attr in &other.attributes {
            if !self.attributes.contains(attr) {
                self.attributes.push(attr.clone());
            }
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn expr_ids(&self) -> impl Iterator<Item = ExprId> + '_ {
        self.expr_ids.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.expr_ids.is_empty() && self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_set_union() {
        let a = UnknownSet::of_expr_id(ExprId::new(1));
        let b = UnknownSet::of_expr_id(ExprId::new(2));
        let merged = a.merge(b);
        assert_eq!(merged.expr_ids().count(), 2);
    }

    #[test]
    fn merging_same_attribute_does_not_duplicate() {
        let attr = Attribute::from_identifier("x");
        let a = UnknownSet::of_attribute(attr.clone());
        let b = UnknownSet::of_attribute(attr);
        let merged = a.merge(b);
        assert_eq!(merged.attributes().len(), 1);
    }
}
