// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! QueryCache - deterministic cache keys and result caching for aggregation queries
//!
//! QueryCache sits between a data-access layer and the engine that computes
//! aggregation results. It turns a query into a canonical cache key, serves
//! results from a local or shared cache, and stores large exports by id.
//!
//! # Features
//!
//! - **Canonical keys**: equivalent queries map to the same key, different
//!   queries never collide
//! - **Filter model**: typed predicates with negation, in-memory evaluation,
//!   normalization and where/having splitting
//! - **Local and remote caches**: moka in-process cache, or any key/value
//!   store (memory, sled, redis)
//! - **Export storage**: stream results to files or to remote lists
//! - **Permission aware**: row-dependent filters never reach the cache
//!
//! # Usage
//!
//! ```ignore
//! use querycache::{CachingQueryExecutor, LocalCache, MetricProjection, Query, Table};
//!
//! let cache = Arc::new(LocalCache::new(1000, Duration::from_secs(300)));
//! let executor = CachingQueryExecutor::new(engine, Some(cache));
//! let query = Query::new(Table::new("playerStats"))
//!     .metric(MetricProjection::new("playerStats.highScore"));
//! let outcome = executor.load(&query)?;
//! ```

pub mod cache;
pub mod executor;
pub mod export;
pub mod filter;
pub mod path;
pub mod query;
pub mod remote;
pub mod schema;
pub mod value;

pub use cache::{CacheConfig, CacheError, LocalCache, QueryCache, RemoteCache};
pub use executor::{CachingQueryExecutor, ExecutionError, QueryEngine, QueryOutcome};
pub use export::{
    FileResultStorageEngine, RemoteResultStorageEngine, ResultStorageEngine, StorageError,
    TableExportResult,
};
pub use filter::{FilterExpression, FilterPredicate, Operator};
pub use path::{Path, PathElement};
pub use query::{
    DimensionProjection, MetricProjection, Query, QueryKeyExtractor, QueryResult, Row, Table,
    TimeDimensionProjection, TimeGrain,
};
pub use schema::{TypeName, TypeRegistry};
pub use value::Value;

/// QueryCache version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// QueryCache crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
