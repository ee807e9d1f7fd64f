// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Negation normal form

use super::{FilterExpression, FilterPredicate, FilterVisitor};

/// Push every `Not` down to the predicates, leaving no `Not` nodes
///
/// The result is equivalent for every non-null field. Ordering operators are
/// false on null both ways, so `Not(Lt)` holds for a null field while the
/// rewritten `Ge` does not: normalized filters drop rows whose compared
/// field is null.
pub fn normalize(expression: &FilterExpression) -> FilterExpression {
    expression.accept(&mut NotPushdown)
}

struct NotPushdown;

impl FilterVisitor<FilterExpression> for NotPushdown {
    fn visit_predicate(&mut self, predicate: &FilterPredicate) -> FilterExpression {
        FilterExpression::Predicate(predicate.clone())
    }

    fn visit_and(&mut self, left: &FilterExpression, right: &FilterExpression) -> FilterExpression {
        FilterExpression::and(left.accept(self), right.accept(self))
    }

    fn visit_or(&mut self, left: &FilterExpression, right: &FilterExpression) -> FilterExpression {
        FilterExpression::or(left.accept(self), right.accept(self))
    }

    fn visit_not(&mut self, negated: &FilterExpression) -> FilterExpression {
        // Normalize first so the De Morgan inverse never sees a nested Not
        negated.accept(self).negate()
    }
}
