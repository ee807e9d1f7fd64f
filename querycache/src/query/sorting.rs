// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Ordered sort specification

use super::QueryError;
use crate::path::Path;
use crate::schema::{TypeName, TypeRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRule {
    pub path: Path,
    pub order: SortOrder,
}

/// Sort paths for one entity, in priority order
///
/// Adding a path that is already present replaces its order in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sorting {
    scope: TypeName,
    rules: Vec<SortRule>,
}

impl Sorting {
    pub fn new(scope: TypeName) -> Self {
        Self {
            scope,
            rules: Vec::new(),
        }
    }

    pub fn by(mut self, path: Path, order: SortOrder) -> Self {
        self.add(path, order);
        self
    }

    pub fn add(&mut self, path: Path, order: SortOrder) {
        match self.rules.iter_mut().find(|rule| rule.path == path) {
            Some(existing) => existing.order = order,
            None => self.rules.push(SortRule { path, order }),
        }
    }

    pub fn scope(&self) -> &TypeName {
        &self.scope
    }

    pub fn rules(&self) -> &[SortRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parse a sort clause such as `-highScore,playerName`
    ///
    /// A leading `-` sorts descending; a leading `+` or none sorts ascending.
    pub fn parse(
        registry: &TypeRegistry,
        scope: &TypeName,
        clause: &str,
    ) -> Result<Sorting, QueryError> {
        let mut sorting = Sorting::new(scope.clone());

        for term in clause.split(',').map(str::trim) {
            let (order, field) = match term.as_bytes().first() {
                Some(b'-') => (SortOrder::Desc, &term[1..]),
                Some(b'+') => (SortOrder::Asc, &term[1..]),
                Some(_) => (SortOrder::Asc, term),
                None => {
                    return Err(QueryError::InvalidSorting(format!(
                        "empty sort term in '{}'",
                        clause
                    )))
                }
            };
            let path = registry.resolve_path(scope, field)?;
            sorting.add(path, order);
        }

        sorting.validate(registry)?;
        Ok(sorting)
    }

    /// Sorting across a to-many relationship is ambiguous and rejected
    pub fn validate(&self, registry: &TypeRegistry) -> Result<(), QueryError> {
        for rule in &self.rules {
            if registry.path_crosses_to_many(&rule.path) {
                return Err(QueryError::InvalidSorting(format!(
                    "cannot sort across a to-many relationship: {}",
                    rule.path
                )));
            }
        }
        Ok(())
    }
}
