// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Split a filter into a WHERE part over dimensions and a HAVING part over metrics

use super::{normalize, FilterExpression, FilterPredicate, FilterVisitor};
use crate::path::Path;

/// Result of splitting a filter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WhereHaving {
    pub where_expr: Option<FilterExpression>,
    pub having_expr: Option<FilterExpression>,
}

impl WhereHaving {
    fn where_only(expr: FilterExpression) -> Self {
        Self {
            where_expr: Some(expr),
            having_expr: None,
        }
    }

    fn having_only(expr: FilterExpression) -> Self {
        Self {
            where_expr: None,
            having_expr: Some(expr),
        }
    }

    fn is_pure_where(&self) -> bool {
        self.having_expr.is_none()
    }

    fn is_pure_having(&self) -> bool {
        self.where_expr.is_none()
    }

    /// Recombine both halves with AND
    fn combined(self) -> Option<FilterExpression> {
        conjoin(self.where_expr, self.having_expr)
    }
}

fn conjoin(
    left: Option<FilterExpression>,
    right: Option<FilterExpression>,
) -> Option<FilterExpression> {
    match (left, right) {
        (Some(l), Some(r)) => Some(FilterExpression::and(l, r)),
        (l, r) => l.or(r),
    }
}

/// Split `expression` using `is_metric` to classify predicate paths
///
/// Conjunctions split cleanly. A disjunction mixing both kinds moves whole
/// into HAVING.
///
/// The filter is normalized first, so a negated ordering predicate such as
/// `Not(highScore < 5)` becomes `highScore >= 5` and no longer matches rows
/// where the metric is null. See [`normalize`](super::normalize::normalize).
pub fn split_where_having<F>(expression: &FilterExpression, is_metric: F) -> WhereHaving
where
    F: Fn(&Path) -> bool,
{
    let normalized = normalize(expression);
    let mut splitter = Splitter { is_metric };
    normalized.accept(&mut splitter)
}

struct Splitter<F> {
    is_metric: F,
}

impl<F: Fn(&Path) -> bool> FilterVisitor<WhereHaving> for Splitter<F> {
    fn visit_predicate(&mut self, predicate: &FilterPredicate) -> WhereHaving {
        let expr = FilterExpression::Predicate(predicate.clone());
        if (self.is_metric)(predicate.path()) {
            WhereHaving::having_only(expr)
        } else {
            WhereHaving::where_only(expr)
        }
    }

    fn visit_and(&mut self, left: &FilterExpression, right: &FilterExpression) -> WhereHaving {
        let l = left.accept(self);
        let r = right.accept(self);
        WhereHaving {
            where_expr: conjoin(l.where_expr, r.where_expr),
            having_expr: conjoin(l.having_expr, r.having_expr),
        }
    }

    fn visit_or(&mut self, left: &FilterExpression, right: &FilterExpression) -> WhereHaving {
        let l = left.accept(self);
        let r = right.accept(self);

        if l.is_pure_where() && r.is_pure_where() {
            if let (Some(lw), Some(rw)) = (l.where_expr.clone(), r.where_expr.clone()) {
                return WhereHaving::where_only(FilterExpression::or(lw, rw));
            }
        }
        if l.is_pure_having() && r.is_pure_having() {
            if let (Some(lh), Some(rh)) = (l.having_expr.clone(), r.having_expr.clone()) {
                return WhereHaving::having_only(FilterExpression::or(lh, rh));
            }
        }

        match (l.combined(), r.combined()) {
            (Some(lc), Some(rc)) => WhereHaving::having_only(FilterExpression::or(lc, rc)),
            (Some(only), None) | (None, Some(only)) => WhereHaving::having_only(only),
            (None, None) => WhereHaving::default(),
        }
    }

    fn visit_not(&mut self, negated: &FilterExpression) -> WhereHaving {
        // Input is normalized, but stay total
        normalize(&FilterExpression::not(negated.clone())).accept(self)
    }
}
