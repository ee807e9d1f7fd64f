// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Filter expression model
//!
//! A filter is a small recursive tree of predicates combined with AND, OR and
//! NOT. Consumers walk it through [`FilterVisitor`]:
//! - the cache key extractor serializes it
//! - [`access::FieldAccessVisitor`] checks field permissions
//! - [`evaluate::InMemoryFilter`] tests rows
//! - [`split::split_where_having`] routes predicates to WHERE or HAVING

pub mod access;
pub mod evaluate;
pub mod expression;
pub mod normalize;
pub mod operator;
pub mod split;

pub use access::{AccessVerdict, FieldAccessVisitor, FieldPermissions, PermissionCheck};
pub use evaluate::{FieldSource, InMemoryFilter};
pub use expression::{FilterExpression, FilterPredicate, FilterVisitor};
pub use normalize::normalize;
pub use operator::{Arity, Operator};
pub use split::{split_where_having, WhereHaving};

use thiserror::Error;

/// Errors raised while building filter expressions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Operator {operator} expects {expected} values, got {actual}")]
    InvalidArity {
        operator: Operator,
        expected: Arity,
        actual: usize,
    },

    #[error("Predicate path must not be empty")]
    EmptyPath,

    #[error("Invalid filter value: {0}")]
    InvalidValue(String),
}
