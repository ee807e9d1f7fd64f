// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory evaluation of filter expressions

use super::{FilterExpression, FilterPredicate, FilterVisitor, Operator};
use crate::path::Path;
use crate::query::Row;
use crate::value::Value;
use std::cmp::Ordering;

/// Anything that can produce a value for a path
pub trait FieldSource {
    /// Value at `path`, or [`Value::Null`] when absent
    fn field(&self, path: &Path) -> Value;
}

/// Rows are keyed by dotted field path, falling back to the last field name
impl FieldSource for Row {
    fn field(&self, path: &Path) -> Value {
        self.get(&path.field_path())
            .or_else(|| self.get(path.last_element().field_name()))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

impl Operator {
    /// Evaluate this operator for a field value against the predicate values
    pub fn test(&self, field: &Value, values: &[Value]) -> bool {
        match self {
            Operator::In => values.iter().any(|v| field.loosely_equals(v)),
            Operator::InInsensitive => values.iter().any(|v| field.eq_ignore_case(v)),

            Operator::Prefix => string_match(field, values, false, |f, v| f.starts_with(v)),
            Operator::PrefixCaseInsensitive => {
                string_match(field, values, true, |f, v| f.starts_with(v))
            }
            Operator::Postfix => string_match(field, values, false, |f, v| f.ends_with(v)),
            Operator::PostfixCaseInsensitive => {
                string_match(field, values, true, |f, v| f.ends_with(v))
            }
            Operator::Infix => string_match(field, values, false, |f, v| f.contains(v)),
            Operator::InfixCaseInsensitive => {
                string_match(field, values, true, |f, v| f.contains(v))
            }

            Operator::IsNull => field.is_null(),

            Operator::Lt => compare_first(field, values, |o| o == Ordering::Less),
            Operator::Le => compare_first(field, values, |o| o != Ordering::Greater),
            Operator::Gt => compare_first(field, values, |o| o == Ordering::Greater),
            Operator::Ge => compare_first(field, values, |o| o != Ordering::Less),
            Operator::Between => match bounds(field, values) {
                Some((low, high)) => low != Ordering::Less && high != Ordering::Greater,
                None => false,
            },
            Operator::NotBetween => match bounds(field, values) {
                Some((low, high)) => low == Ordering::Less || high == Ordering::Greater,
                None => false,
            },

            Operator::True => true,
            Operator::False => false,

            Operator::IsEmpty => field.is_null() || field.collection_len() == Some(0),
            Operator::HasMember => match (field.as_list(), values.first()) {
                (Some(items), Some(member)) => items.iter().any(|i| i.loosely_equals(member)),
                _ => false,
            },

            // Complements of the positive operators above
            Operator::NotIn
            | Operator::NotInInsensitive
            | Operator::NotPrefix
            | Operator::NotPrefixCaseInsensitive
            | Operator::NotPostfix
            | Operator::NotPostfixCaseInsensitive
            | Operator::NotInfix
            | Operator::NotInfixCaseInsensitive
            | Operator::NotNull
            | Operator::NotEmpty
            | Operator::HasNoMember => !self.negate().test(field, values),
        }
    }
}

fn string_match(
    field: &Value,
    values: &[Value],
    ignore_case: bool,
    matcher: impl Fn(&str, &str) -> bool,
) -> bool {
    let Some(needle) = values.first() else {
        return false;
    };
    if field.is_null() {
        return false;
    }
    let (haystack, needle) = (field.to_string(), needle.to_string());
    if ignore_case {
        matcher(&haystack.to_lowercase(), &needle.to_lowercase())
    } else {
        matcher(&haystack, &needle)
    }
}

fn compare_first(field: &Value, values: &[Value], check: impl Fn(Ordering) -> bool) -> bool {
    values
        .first()
        .and_then(|v| field.compare(v))
        .map(check)
        .unwrap_or(false)
}

fn bounds(field: &Value, values: &[Value]) -> Option<(Ordering, Ordering)> {
    match values {
        [low, high] => Some((field.compare(low)?, field.compare(high)?)),
        _ => None,
    }
}

/// Evaluates an expression against a single [`FieldSource`]
pub struct InMemoryFilter<'a, S: FieldSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: FieldSource + ?Sized> InMemoryFilter<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    pub fn matches(&mut self, expression: &FilterExpression) -> bool {
        expression.accept(self)
    }
}

impl<S: FieldSource + ?Sized> FilterVisitor<bool> for InMemoryFilter<'_, S> {
    fn visit_predicate(&mut self, predicate: &FilterPredicate) -> bool {
        let value = self.source.field(predicate.path());
        predicate.operator().test(&value, predicate.values())
    }

    fn visit_and(&mut self, left: &FilterExpression, right: &FilterExpression) -> bool {
        left.accept(self) && right.accept(self)
    }

    fn visit_or(&mut self, left: &FilterExpression, right: &FilterExpression) -> bool {
        left.accept(self) || right.accept(self)
    }

    fn visit_not(&mut self, negated: &FilterExpression) -> bool {
        !negated.accept(self)
    }
}
