// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache-aside query execution
//!
//! [`CachingQueryExecutor`] consults the result cache before handing a query
//! to the underlying [`QueryEngine`] and stores freshly computed results.
//! Queries whose filters touch fields with row-dependent permissions are
//! never served from or written to the cache.

use crate::cache::{CacheError, QueryCache};
use crate::filter::{AccessVerdict, FieldAccessVisitor, FieldPermissions};
use crate::query::{Query, QueryError, QueryKeyExtractor, QueryResult};
use std::sync::Arc;
use thiserror::Error;

/// Error type produced by query engines
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Read access denied on filter of table {0}")]
    Forbidden(String),

    #[error("Query engine failed: {0}")]
    Engine(#[source] EngineError),

    #[error("Cache lookup failed: {0}")]
    Cache(#[from] CacheError),

    /// The result was computed but could not be cached
    #[error("Failed to cache computed result: {source}")]
    CacheWrite {
        result: Arc<QueryResult>,
        #[source]
        source: CacheError,
    },

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Computes query results; the expensive step the cache sits in front of
pub trait QueryEngine: Send + Sync {
    fn execute(&self, query: &Query) -> Result<QueryResult, EngineError>;
}

impl<F> QueryEngine for F
where
    F: Fn(&Query) -> Result<QueryResult, EngineError> + Send + Sync,
{
    fn execute(&self, query: &Query) -> Result<QueryResult, EngineError> {
        self(query)
    }
}

/// Result of [`CachingQueryExecutor::load`]
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub result: Arc<QueryResult>,
    /// Key the result was looked up under; `None` when the cache was skipped
    pub cache_key: Option<String>,
    pub from_cache: bool,
    /// Total row count, present only when the query asked for totals
    pub page_totals: Option<u64>,
}

/// Cache key for `query`: table version, `;`, then the canonical query key
pub fn cache_key(query: &Query) -> String {
    let version = query.table.version.as_deref().unwrap_or("");
    let key = QueryKeyExtractor::extract_key(query);
    let mut out = String::with_capacity(version.len() + 1 + key.len());
    out.push_str(version);
    out.push(';');
    out.push_str(&key);
    out
}

pub struct CachingQueryExecutor<E: QueryEngine> {
    engine: E,
    cache: Option<Arc<dyn QueryCache>>,
    permissions: Option<Arc<dyn FieldPermissions>>,
}

impl<E: QueryEngine> CachingQueryExecutor<E> {
    pub fn new(engine: E, cache: Option<Arc<dyn QueryCache>>) -> Self {
        Self {
            engine,
            cache,
            permissions: None,
        }
    }

    /// Check filter fields against `permissions` before every load
    pub fn with_permissions(mut self, permissions: Arc<dyn FieldPermissions>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn verify_access(&self, query: &Query) -> AccessVerdict {
        let Some(permissions) = &self.permissions else {
            return AccessVerdict::Allowed;
        };
        let mut visitor = FieldAccessVisitor::new(permissions.as_ref());
        [&query.where_filter, &query.having_filter]
            .into_iter()
            .flatten()
            .map(|filter| visitor.verify(filter))
            .max()
            .unwrap_or(AccessVerdict::Allowed)
    }

    pub fn load(&self, query: &Query) -> Result<QueryOutcome, ExecutionError> {
        query.validate()?;

        let mut use_cache = self.cache.is_some();
        if query.bypass_cache && use_cache {
            log::info!("Cache bypass requested for table {}", query.table.id);
            use_cache = false;
        }

        match self.verify_access(query) {
            AccessVerdict::Denied => return Err(ExecutionError::Forbidden(query.table.id.clone())),
            AccessVerdict::Deferred => {
                if use_cache {
                    log::info!(
                        "Bypassing cache for table {}: filter permissions depend on rows",
                        query.table.id
                    );
                }
                use_cache = false;
            }
            AccessVerdict::Allowed => {}
        }

        let cache = self.cache.as_ref().filter(|_| use_cache);
        let key = cache.map(|_| cache_key(query));

        if let (Some(cache), Some(key)) = (cache, key.as_deref()) {
            if let Some(result) = cache.get(key)? {
                log::debug!("Cache hit: {}", key);
                return Ok(self.outcome(query, result, Some(key.to_string()), true));
            }
            log::debug!("Cache miss: {}", key);
        }

        let result = Arc::new(self.engine.execute(query).map_err(ExecutionError::Engine)?);

        if let (Some(cache), Some(key)) = (cache, key.as_deref()) {
            if let Err(source) = cache.put(key, Arc::clone(&result)) {
                log::warn!("Failed to cache result for {}: {}", key, source);
                return Err(ExecutionError::CacheWrite { result, source });
            }
        }

        Ok(self.outcome(query, result, key, false))
    }

    fn outcome(
        &self,
        query: &Query,
        result: Arc<QueryResult>,
        cache_key: Option<String>,
        from_cache: bool,
    ) -> QueryOutcome {
        let wants_totals = query
            .pagination
            .as_ref()
            .map_or(false, |pagination| pagination.return_totals);
        QueryOutcome {
            page_totals: if wants_totals { result.page_totals } else { None },
            result,
            cache_key,
            from_cache,
        }
    }
}
