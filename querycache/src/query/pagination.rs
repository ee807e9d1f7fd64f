// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Offset/limit pagination

use super::QueryError;
use serde::{Deserialize, Serialize};

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
    /// Whether the total row count should be returned with the page
    #[serde(default)]
    pub return_totals: bool,
}

/// System-wide page size limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 500,
            max_limit: 10_000,
        }
    }
}

/// Raw pagination parameters as supplied by a client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Row offset, or page number when `by_pages` is set
    pub offset: Option<i64>,
    /// Row limit, or page size when `by_pages` is set
    pub limit: Option<i64>,
    pub totals: bool,
    pub by_pages: bool,
}

impl Pagination {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit,
            return_totals: false,
        }
    }

    pub fn with_totals(mut self) -> Self {
        self.return_totals = true;
        self
    }

    /// Resolve client parameters against the system limits
    pub fn from_request(request: &PageRequest, limits: PageLimits) -> Result<Self, QueryError> {
        let label = if request.by_pages { "size" } else { "limit" };
        let limit = request.limit.unwrap_or(limits.default_limit as i64);

        if limit < 1 {
            return Err(QueryError::InvalidPagination(format!(
                "{} must be a positive, non-zero value",
                label
            )));
        }
        if limit as u64 > limits.max_limit {
            return Err(QueryError::InvalidPagination(format!(
                "{} must be less than or equal to {}",
                label, limits.max_limit
            )));
        }
        let limit = limit as u64;

        let offset = if request.by_pages {
            let number = request.offset.unwrap_or(1);
            if number < 1 {
                return Err(QueryError::InvalidPagination(
                    "page number must be a positive, non-zero value".to_string(),
                ));
            }
            (number as u64 - 1).saturating_mul(limit)
        } else {
            let offset = request.offset.unwrap_or(0);
            if offset < 0 {
                return Err(QueryError::InvalidPagination(
                    "offset must not be negative".to_string(),
                ));
            }
            offset as u64
        };

        Ok(Self {
            offset,
            limit,
            return_totals: request.totals,
        })
    }
}
