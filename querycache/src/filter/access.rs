// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Field-level read permission checks over filter expressions

use super::{FilterExpression, FilterPredicate, FilterVisitor};
use crate::schema::TypeName;

/// Outcome of a single field permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCheck {
    Pass,
    Fail,
    /// Depends on the rows being read; only known after execution
    Deferred,
}

/// Caller-supplied field permission policy
pub trait FieldPermissions: Send + Sync {
    fn check_read(&self, entity: &TypeName, field: &str) -> PermissionCheck;
}

/// Verdict for a whole expression, ordered from most to least permissive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessVerdict {
    Allowed,
    Deferred,
    Denied,
}

impl AccessVerdict {
    fn combine(self, other: AccessVerdict) -> AccessVerdict {
        self.max(other)
    }
}

impl From<PermissionCheck> for AccessVerdict {
    fn from(check: PermissionCheck) -> Self {
        match check {
            PermissionCheck::Pass => AccessVerdict::Allowed,
            PermissionCheck::Fail => AccessVerdict::Denied,
            PermissionCheck::Deferred => AccessVerdict::Deferred,
        }
    }
}

/// Walks every path element of every predicate
pub struct FieldAccessVisitor<'a> {
    permissions: &'a dyn FieldPermissions,
}

impl<'a> FieldAccessVisitor<'a> {
    pub fn new(permissions: &'a dyn FieldPermissions) -> Self {
        Self { permissions }
    }

    pub fn verify(&mut self, expression: &FilterExpression) -> AccessVerdict {
        expression.accept(self)
    }
}

impl FilterVisitor<AccessVerdict> for FieldAccessVisitor<'_> {
    fn visit_predicate(&mut self, predicate: &FilterPredicate) -> AccessVerdict {
        let mut verdict = AccessVerdict::Allowed;
        for element in predicate.path().elements() {
            let check = self
                .permissions
                .check_read(element.source_type(), element.field_name());
            verdict = verdict.combine(check.into());
            if verdict == AccessVerdict::Denied {
                log::debug!(
                    "Read denied on {}.{}",
                    element.source_type(),
                    element.field_name()
                );
                break;
            }
        }
        verdict
    }

    fn visit_and(&mut self, left: &FilterExpression, right: &FilterExpression) -> AccessVerdict {
        left.accept(self).combine(right.accept(self))
    }

    fn visit_or(&mut self, left: &FilterExpression, right: &FilterExpression) -> AccessVerdict {
        left.accept(self).combine(right.accept(self))
    }

    fn visit_not(&mut self, negated: &FilterExpression) -> AccessVerdict {
        negated.accept(self)
    }
}
