// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Aggregation query description
//!
//! A query names a source table, an ordered list of metric projections,
//! unordered sets of dimensions and time dimensions, optional WHERE and
//! HAVING filters, sorting and pagination. [`key::QueryKeyExtractor`] turns
//! it into a canonical cache key.

pub mod key;
pub mod pagination;
pub mod result;
pub mod sorting;
pub mod time_grain;

pub use key::{KeyExplanation, QueryKeyExtractor};
pub use pagination::{PageLimits, PageRequest, Pagination};
pub use result::{QueryResult, Row};
pub use sorting::{SortOrder, Sorting};
pub use time_grain::TimeGrain;

use crate::filter::FilterExpression;
use crate::schema::{is_valid_identifier, SchemaError};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while building or validating a query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Invalid identifier in {context}: {name:?}")]
    InvalidIdentifier { context: &'static str, name: String },

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Invalid sorting: {0}")]
    InvalidSorting(String),

    #[error("Unknown time grain: {0}")]
    UnknownTimeGrain(String),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

fn check_identifier(context: &'static str, name: &str) -> Result<(), QueryError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(QueryError::InvalidIdentifier {
            context,
            name: name.to_string(),
        })
    }
}

/// Source table of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    /// Data version; prefixes the cache key so new data never hits old entries
    #[serde(default)]
    pub version: Option<String>,
}

impl Table {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Named projection argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub value: Value,
}

pub type Arguments = BTreeMap<String, Argument>;

fn insert_argument(arguments: &mut Arguments, name: &str, value: Value) {
    arguments.insert(
        name.to_string(),
        Argument {
            name: name.to_string(),
            value,
        },
    );
}

/// Metric column projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricProjection {
    /// Qualified `table.name` of the metric column
    pub column_id: String,
    pub alias: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl MetricProjection {
    /// Projection aliased by its column name
    pub fn new(column_id: impl Into<String>) -> Self {
        let column_id = column_id.into();
        let alias = column_name(&column_id).to_string();
        Self {
            column_id,
            alias,
            arguments: Arguments::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_argument(mut self, name: &str, value: impl Into<Value>) -> Self {
        insert_argument(&mut self.arguments, name, value.into());
        self
    }

    /// Unqualified column name
    pub fn name(&self) -> &str {
        column_name(&self.column_id)
    }
}

fn column_name(column_id: &str) -> &str {
    column_id
        .rsplit_once('.')
        .map(|(_, name)| name)
        .unwrap_or(column_id)
}

/// Group-by dimension projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionProjection {
    pub alias: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl DimensionProjection {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            arguments: Arguments::new(),
        }
    }

    pub fn with_argument(mut self, name: &str, value: impl Into<Value>) -> Self {
        insert_argument(&mut self.arguments, name, value.into());
        self
    }
}

/// Time dimension bucketed by a grain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeDimensionProjection {
    pub alias: String,
    pub grain: TimeGrain,
    #[serde(default)]
    pub arguments: Arguments,
}

impl TimeDimensionProjection {
    pub fn new(alias: impl Into<String>, grain: TimeGrain) -> Self {
        Self {
            alias: alias.into(),
            grain,
            arguments: Arguments::new(),
        }
    }

    pub fn with_argument(mut self, name: &str, value: impl Into<Value>) -> Self {
        insert_argument(&mut self.arguments, name, value.into());
        self
    }
}

/// Complete aggregation query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub table: Table,
    #[serde(default)]
    pub metrics: Vec<MetricProjection>,
    #[serde(default)]
    pub dimensions: Vec<DimensionProjection>,
    #[serde(default)]
    pub time_dimensions: Vec<TimeDimensionProjection>,
    #[serde(default)]
    pub where_filter: Option<FilterExpression>,
    #[serde(default)]
    pub having_filter: Option<FilterExpression>,
    #[serde(default)]
    pub sorting: Option<Sorting>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    /// Skip cache lookup and population; not part of the key
    #[serde(default)]
    pub bypass_cache: bool,
}

impl Query {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            metrics: Vec::new(),
            dimensions: Vec::new(),
            time_dimensions: Vec::new(),
            where_filter: None,
            having_filter: None,
            sorting: None,
            pagination: None,
            bypass_cache: false,
        }
    }

    pub fn metric(mut self, metric: MetricProjection) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn dimension(mut self, dimension: DimensionProjection) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn time_dimension(mut self, dimension: TimeDimensionProjection) -> Self {
        self.time_dimensions.push(dimension);
        self
    }

    pub fn where_filter(mut self, filter: FilterExpression) -> Self {
        self.where_filter = Some(filter);
        self
    }

    pub fn having_filter(mut self, filter: FilterExpression) -> Self {
        self.having_filter = Some(filter);
        self
    }

    pub fn sorting(mut self, sorting: Sorting) -> Self {
        self.sorting = Some(sorting);
        self
    }

    pub fn pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }

    /// Check that every identifier can be emitted into a cache key verbatim
    pub fn validate(&self) -> Result<(), QueryError> {
        check_identifier("table", &self.table.id)?;
        if let Some(version) = &self.table.version {
            // Empty versions are allowed; they produce the same prefix as none
            if !version.is_empty() {
                check_identifier("table version", version)?;
            }
        }
        for metric in &self.metrics {
            check_identifier("metric", &metric.column_id)?;
            check_identifier("metric alias", &metric.alias)?;
            check_arguments(&metric.arguments)?;
        }
        for dimension in &self.dimensions {
            check_identifier("dimension", &dimension.alias)?;
            check_arguments(&dimension.arguments)?;
        }
        for dimension in &self.time_dimensions {
            check_identifier("time dimension", &dimension.alias)?;
            check_arguments(&dimension.arguments)?;
        }
        Ok(())
    }
}

fn check_arguments(arguments: &Arguments) -> Result<(), QueryError> {
    for (key, argument) in arguments {
        check_identifier("argument", key)?;
        check_identifier("argument name", &argument.name)?;
    }
    Ok(())
}
