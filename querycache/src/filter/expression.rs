// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Filter expression tree and visitor dispatch

use super::{FilterError, Operator};
use crate::path::Path;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Leaf condition: `path operator values`
///
/// The value list keeps caller order. Arity is checked on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPredicate")]
pub struct FilterPredicate {
    path: Path,
    operator: Operator,
    values: Vec<Value>,
}

#[derive(Deserialize)]
struct RawPredicate {
    path: Path,
    operator: Operator,
    #[serde(default)]
    values: Vec<Value>,
}

impl TryFrom<RawPredicate> for FilterPredicate {
    type Error = FilterError;

    fn try_from(raw: RawPredicate) -> Result<Self, Self::Error> {
        FilterPredicate::new(raw.path, raw.operator, raw.values)
    }
}

impl FilterPredicate {
    pub fn new(path: Path, operator: Operator, values: Vec<Value>) -> Result<Self, FilterError> {
        operator.check_arity(values.len())?;
        Ok(Self {
            path,
            operator,
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Same path and values under the complementary operator
    pub fn negate(&self) -> FilterPredicate {
        FilterPredicate {
            path: self.path.clone(),
            operator: self.operator.negate(),
            values: self.values.clone(),
        }
    }
}

/// Boolean filter over entity paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpression {
    Predicate(FilterPredicate),
    And(Box<FilterExpression>, Box<FilterExpression>),
    Or(Box<FilterExpression>, Box<FilterExpression>),
    Not(Box<FilterExpression>),
}

/// Traversal over a filter expression
pub trait FilterVisitor<T> {
    fn visit_predicate(&mut self, predicate: &FilterPredicate) -> T;
    fn visit_and(&mut self, left: &FilterExpression, right: &FilterExpression) -> T;
    fn visit_or(&mut self, left: &FilterExpression, right: &FilterExpression) -> T;
    fn visit_not(&mut self, negated: &FilterExpression) -> T;
}

impl FilterExpression {
    pub fn accept<T, V>(&self, visitor: &mut V) -> T
    where
        V: FilterVisitor<T> + ?Sized,
    {
        match self {
            FilterExpression::Predicate(predicate) => visitor.visit_predicate(predicate),
            FilterExpression::And(left, right) => visitor.visit_and(left, right),
            FilterExpression::Or(left, right) => visitor.visit_or(left, right),
            FilterExpression::Not(negated) => visitor.visit_not(negated),
        }
    }

    pub fn predicate(
        path: Path,
        operator: Operator,
        values: Vec<Value>,
    ) -> Result<Self, FilterError> {
        FilterPredicate::new(path, operator, values).map(FilterExpression::Predicate)
    }

    fn single(path: Path, operator: Operator, value: Value) -> Self {
        FilterExpression::Predicate(FilterPredicate {
            path,
            operator,
            values: vec![value],
        })
    }

    fn nullary(path: Path, operator: Operator) -> Self {
        FilterExpression::Predicate(FilterPredicate {
            path,
            operator,
            values: Vec::new(),
        })
    }

    /// `path IN (value)`
    pub fn eq(path: Path, value: impl Into<Value>) -> Self {
        Self::single(path, Operator::In, value.into())
    }

    pub fn in_values(path: Path, values: Vec<Value>) -> Result<Self, FilterError> {
        Self::predicate(path, Operator::In, values)
    }

    pub fn not_in(path: Path, values: Vec<Value>) -> Result<Self, FilterError> {
        Self::predicate(path, Operator::NotIn, values)
    }

    pub fn ge(path: Path, value: impl Into<Value>) -> Self {
        Self::single(path, Operator::Ge, value.into())
    }

    pub fn gt(path: Path, value: impl Into<Value>) -> Self {
        Self::single(path, Operator::Gt, value.into())
    }

    pub fn le(path: Path, value: impl Into<Value>) -> Self {
        Self::single(path, Operator::Le, value.into())
    }

    pub fn lt(path: Path, value: impl Into<Value>) -> Self {
        Self::single(path, Operator::Lt, value.into())
    }

    pub fn is_null(path: Path) -> Self {
        Self::nullary(path, Operator::IsNull)
    }

    pub fn not_null(path: Path) -> Self {
        Self::nullary(path, Operator::NotNull)
    }

    pub fn has_member(path: Path, value: impl Into<Value>) -> Self {
        Self::single(path, Operator::HasMember, value.into())
    }

    pub fn has_no_member(path: Path, value: impl Into<Value>) -> Self {
        Self::single(path, Operator::HasNoMember, value.into())
    }

    pub fn between(path: Path, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        FilterExpression::Predicate(FilterPredicate {
            path,
            operator: Operator::Between,
            values: vec![low.into(), high.into()],
        })
    }

    pub fn prefix(path: Path, value: impl Into<String>) -> Self {
        Self::single(path, Operator::Prefix, Value::String(value.into()))
    }

    pub fn infix(path: Path, value: impl Into<String>) -> Self {
        Self::single(path, Operator::Infix, Value::String(value.into()))
    }

    pub fn postfix(path: Path, value: impl Into<String>) -> Self {
        Self::single(path, Operator::Postfix, Value::String(value.into()))
    }

    pub fn and(left: FilterExpression, right: FilterExpression) -> Self {
        FilterExpression::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: FilterExpression, right: FilterExpression) -> Self {
        FilterExpression::Or(Box::new(left), Box::new(right))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(negated: FilterExpression) -> Self {
        FilterExpression::Not(Box::new(negated))
    }

    /// De Morgan inverse of this expression
    pub fn negate(&self) -> FilterExpression {
        match self {
            FilterExpression::Predicate(predicate) => {
                FilterExpression::Predicate(predicate.negate())
            }
            FilterExpression::And(left, right) => {
                FilterExpression::or(left.negate(), right.negate())
            }
            FilterExpression::Or(left, right) => {
                FilterExpression::and(left.negate(), right.negate())
            }
            FilterExpression::Not(negated) => (**negated).clone(),
        }
    }

    /// All predicates in left-to-right order
    pub fn predicates(&self) -> Vec<&FilterPredicate> {
        let mut out = Vec::new();
        self.collect_predicates(&mut out);
        out
    }

    fn collect_predicates<'a>(&'a self, out: &mut Vec<&'a FilterPredicate>) {
        match self {
            FilterExpression::Predicate(predicate) => out.push(predicate),
            FilterExpression::And(left, right) | FilterExpression::Or(left, right) => {
                left.collect_predicates(out);
                right.collect_predicates(out);
            }
            FilterExpression::Not(negated) => negated.collect_predicates(out),
        }
    }

    pub fn contains_not(&self) -> bool {
        match self {
            FilterExpression::Predicate(_) => false,
            FilterExpression::And(left, right) | FilterExpression::Or(left, right) => {
                left.contains_not() || right.contains_not()
            }
            FilterExpression::Not(_) => true,
        }
    }
}

impl From<FilterPredicate> for FilterExpression {
    fn from(predicate: FilterPredicate) -> Self {
        FilterExpression::Predicate(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeName;

    fn path(field: &str, ty: TypeName) -> Path {
        Path::attribute(TypeName::new("example.PlayerStats").unwrap(), ty, field).unwrap()
    }

    struct Depth;

    impl FilterVisitor<usize> for Depth {
        fn visit_predicate(&mut self, _: &FilterPredicate) -> usize {
            1
        }
        fn visit_and(&mut self, l: &FilterExpression, r: &FilterExpression) -> usize {
            1 + l.accept(self).max(r.accept(self))
        }
        fn visit_or(&mut self, l: &FilterExpression, r: &FilterExpression) -> usize {
            1 + l.accept(self).max(r.accept(self))
        }
        fn visit_not(&mut self, e: &FilterExpression) -> usize {
            1 + e.accept(self)
        }
    }

    #[test]
    fn test_accept_dispatch() {
        let expr = FilterExpression::and(
            FilterExpression::ge(path("highScore", TypeName::LONG), 100i64),
            FilterExpression::not(FilterExpression::is_null(path("playerName", TypeName::STRING))),
        );
        assert_eq!(expr.accept(&mut Depth), 3);
        assert_eq!(expr.predicates().len(), 2);
        assert!(expr.contains_not());
    }

    #[test]
    fn test_arity_checked() {
        let empty_in = FilterExpression::in_values(path("playerName", TypeName::STRING), vec![]);
        assert!(matches!(empty_in, Err(FilterError::InvalidArity { .. })));

        let bad = FilterPredicate::new(
            path("playerName", TypeName::STRING),
            Operator::NotNull,
            vec![Value::from("x")],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_predicate_negation_round_trip() {
        let predicate = FilterPredicate::new(
            path("playerName", TypeName::STRING),
            Operator::In,
            vec!["A".into(), "B".into()],
        )
        .unwrap();

        let negated = predicate.negate();
        assert_eq!(negated.operator(), Operator::NotIn);
        assert_eq!(negated.values(), predicate.values());
        assert_eq!(negated.negate(), predicate);
    }

    #[test]
    fn test_de_morgan_negation() {
        let a = FilterExpression::gt(path("highScore", TypeName::LONG), 10i64);
        let b = FilterExpression::lt(path("highScore", TypeName::LONG), 20i64);
        let negated = FilterExpression::and(a.clone(), b.clone()).negate();

        assert_eq!(negated, FilterExpression::or(a.negate(), b.negate()));
        assert_eq!(FilterExpression::not(a.clone()).negate(), a);
    }

    #[test]
    fn test_deserialize_validates_arity() {
        let expr = FilterExpression::between(path("highScore", TypeName::LONG), 1i64, 5i64);
        let json = serde_json::to_string(&expr).unwrap();
        let back: FilterExpression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);

        let broken = json.replace(",{\"Integer\":5}", "");
        let parsed: Result<FilterExpression, _> = serde_json::from_str(&broken);
        assert!(parsed.is_err());
    }
}
