// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Filter operators and their negation table

use super::FilterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of values an operator accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == *n,
            Arity::AtLeast(n) => count >= *n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Predicate operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    // Membership
    In,
    NotIn,
    InInsensitive,
    NotInInsensitive,

    // String matching
    Prefix,
    NotPrefix,
    PrefixCaseInsensitive,
    NotPrefixCaseInsensitive,
    Postfix,
    NotPostfix,
    PostfixCaseInsensitive,
    NotPostfixCaseInsensitive,
    Infix,
    NotInfix,
    InfixCaseInsensitive,
    NotInfixCaseInsensitive,

    // Null checks
    IsNull,
    NotNull,

    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Between,
    NotBetween,

    // Constants
    True,
    False,

    // Collections
    IsEmpty,
    NotEmpty,
    HasMember,
    HasNoMember,
}

impl Operator {
    pub const ALL: [Operator; 30] = [
        Operator::In,
        Operator::NotIn,
        Operator::InInsensitive,
        Operator::NotInInsensitive,
        Operator::Prefix,
        Operator::NotPrefix,
        Operator::PrefixCaseInsensitive,
        Operator::NotPrefixCaseInsensitive,
        Operator::Postfix,
        Operator::NotPostfix,
        Operator::PostfixCaseInsensitive,
        Operator::NotPostfixCaseInsensitive,
        Operator::Infix,
        Operator::NotInfix,
        Operator::InfixCaseInsensitive,
        Operator::NotInfixCaseInsensitive,
        Operator::IsNull,
        Operator::NotNull,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::Between,
        Operator::NotBetween,
        Operator::True,
        Operator::False,
        Operator::IsEmpty,
        Operator::NotEmpty,
        Operator::HasMember,
        Operator::HasNoMember,
    ];

    /// Canonical name emitted into cache keys
    pub fn canonical(&self) -> &'static str {
        match self {
            Operator::In => "IN",
            Operator::NotIn => "NOT",
            Operator::InInsensitive => "IN_INSENSITIVE",
            Operator::NotInInsensitive => "NOT_INSENSITIVE",
            Operator::Prefix => "PREFIX",
            Operator::NotPrefix => "NOT_PREFIX",
            Operator::PrefixCaseInsensitive => "PREFIX_CASE_INSENSITIVE",
            Operator::NotPrefixCaseInsensitive => "NOT_PREFIX_CASE_INSENSITIVE",
            Operator::Postfix => "POSTFIX",
            Operator::NotPostfix => "NOT_POSTFIX",
            Operator::PostfixCaseInsensitive => "POSTFIX_CASE_INSENSITIVE",
            Operator::NotPostfixCaseInsensitive => "NOT_POSTFIX_CASE_INSENSITIVE",
            Operator::Infix => "INFIX",
            Operator::NotInfix => "NOT_INFIX",
            Operator::InfixCaseInsensitive => "INFIX_CASE_INSENSITIVE",
            Operator::NotInfixCaseInsensitive => "NOT_INFIX_CASE_INSENSITIVE",
            Operator::IsNull => "ISNULL",
            Operator::NotNull => "NOTNULL",
            Operator::Lt => "LT",
            Operator::Le => "LE",
            Operator::Gt => "GT",
            Operator::Ge => "GE",
            Operator::Between => "BETWEEN",
            Operator::NotBetween => "NOTBETWEEN",
            Operator::True => "TRUE",
            Operator::False => "FALSE",
            Operator::IsEmpty => "ISEMPTY",
            Operator::NotEmpty => "NOTEMPTY",
            Operator::HasMember => "HASMEMBER",
            Operator::HasNoMember => "HASNOMEMBER",
        }
    }

    /// Short notation used by filter dialects, e.g. `ge` or `notprefixi`
    pub fn notation(&self) -> &'static str {
        match self {
            Operator::In => "in",
            Operator::NotIn => "not",
            Operator::InInsensitive => "ini",
            Operator::NotInInsensitive => "noti",
            Operator::Prefix => "prefix",
            Operator::NotPrefix => "notprefix",
            Operator::PrefixCaseInsensitive => "prefixi",
            Operator::NotPrefixCaseInsensitive => "notprefixi",
            Operator::Postfix => "postfix",
            Operator::NotPostfix => "notpostfix",
            Operator::PostfixCaseInsensitive => "postfixi",
            Operator::NotPostfixCaseInsensitive => "notpostfixi",
            Operator::Infix => "infix",
            Operator::NotInfix => "notinfix",
            Operator::InfixCaseInsensitive => "infixi",
            Operator::NotInfixCaseInsensitive => "notinfixi",
            Operator::IsNull => "isnull",
            Operator::NotNull => "notnull",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Between => "between",
            Operator::NotBetween => "notbetween",
            Operator::True => "true",
            Operator::False => "false",
            Operator::IsEmpty => "isempty",
            Operator::NotEmpty => "notempty",
            Operator::HasMember => "hasmember",
            Operator::HasNoMember => "hasnomember",
        }
    }

    /// Parse a notation string such as `in` or `notprefixi`
    pub fn from_notation(notation: &str) -> Result<Operator, FilterError> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.notation() == notation)
            .ok_or_else(|| FilterError::UnknownOperator(notation.to_string()))
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operator::In
            | Operator::NotIn
            | Operator::InInsensitive
            | Operator::NotInInsensitive => Arity::AtLeast(1),

            Operator::IsNull
            | Operator::NotNull
            | Operator::True
            | Operator::False
            | Operator::IsEmpty
            | Operator::NotEmpty => Arity::Exactly(0),

            Operator::Between | Operator::NotBetween => Arity::Exactly(2),

            Operator::Prefix
            | Operator::NotPrefix
            | Operator::PrefixCaseInsensitive
            | Operator::NotPrefixCaseInsensitive
            | Operator::Postfix
            | Operator::NotPostfix
            | Operator::PostfixCaseInsensitive
            | Operator::NotPostfixCaseInsensitive
            | Operator::Infix
            | Operator::NotInfix
            | Operator::InfixCaseInsensitive
            | Operator::NotInfixCaseInsensitive
            | Operator::Lt
            | Operator::Le
            | Operator::Gt
            | Operator::Ge
            | Operator::HasMember
            | Operator::HasNoMember => Arity::Exactly(1),
        }
    }

    /// Check that `count` values satisfy this operator's arity
    pub fn check_arity(&self, count: usize) -> Result<(), FilterError> {
        let expected = self.arity();
        if expected.accepts(count) {
            Ok(())
        } else {
            Err(FilterError::InvalidArity {
                operator: *self,
                expected,
                actual: count,
            })
        }
    }

    /// Logical complement of this operator
    pub fn negate(&self) -> Operator {
        match self {
            Operator::In => Operator::NotIn,
            Operator::NotIn => Operator::In,
            Operator::InInsensitive => Operator::NotInInsensitive,
            Operator::NotInInsensitive => Operator::InInsensitive,
            Operator::Prefix => Operator::NotPrefix,
            Operator::NotPrefix => Operator::Prefix,
            Operator::PrefixCaseInsensitive => Operator::NotPrefixCaseInsensitive,
            Operator::NotPrefixCaseInsensitive => Operator::PrefixCaseInsensitive,
            Operator::Postfix => Operator::NotPostfix,
            Operator::NotPostfix => Operator::Postfix,
            Operator::PostfixCaseInsensitive => Operator::NotPostfixCaseInsensitive,
            Operator::NotPostfixCaseInsensitive => Operator::PostfixCaseInsensitive,
            Operator::Infix => Operator::NotInfix,
            Operator::NotInfix => Operator::Infix,
            Operator::InfixCaseInsensitive => Operator::NotInfixCaseInsensitive,
            Operator::NotInfixCaseInsensitive => Operator::InfixCaseInsensitive,
            Operator::IsNull => Operator::NotNull,
            Operator::NotNull => Operator::IsNull,
            Operator::Lt => Operator::Ge,
            Operator::Ge => Operator::Lt,
            Operator::Le => Operator::Gt,
            Operator::Gt => Operator::Le,
            Operator::Between => Operator::NotBetween,
            Operator::NotBetween => Operator::Between,
            Operator::True => Operator::False,
            Operator::False => Operator::True,
            Operator::IsEmpty => Operator::NotEmpty,
            Operator::NotEmpty => Operator::IsEmpty,
            Operator::HasMember => Operator::HasNoMember,
            Operator::HasNoMember => Operator::HasMember,
        }
    }

    pub fn is_case_insensitive(&self) -> bool {
        matches!(
            self,
            Operator::InInsensitive
                | Operator::NotInInsensitive
                | Operator::PrefixCaseInsensitive
                | Operator::NotPrefixCaseInsensitive
                | Operator::PostfixCaseInsensitive
                | Operator::NotPostfixCaseInsensitive
                | Operator::InfixCaseInsensitive
                | Operator::NotInfixCaseInsensitive
        )
    }

    /// Operators whose result on a null or incomparable field is false in both polarities
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::Lt
                | Operator::Le
                | Operator::Gt
                | Operator::Ge
                | Operator::Between
                | Operator::NotBetween
        )
    }
}

impl FromStr for Operator {
    type Err = FilterError;

    /// Accepts either the notation or the canonical name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::from_notation(s).or_else(|_| {
            Operator::ALL
                .iter()
                .copied()
                .find(|op| op.canonical() == s)
                .ok_or_else(|| FilterError::UnknownOperator(s.to_string()))
        })
    }
}

impl TryFrom<String> for Operator {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.notation().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}
