// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query result caching
//!
//! Results are cached under the keys produced by
//! [`QueryKeyExtractor`](crate::query::QueryKeyExtractor) and shared as
//! immutable `Arc<QueryResult>` snapshots.
//!
//! - [`LocalCache`]: bounded in-process cache with expire-after-write
//! - [`RemoteCache`]: cache in a shared store reached through a
//!   [`KeyValueClient`](crate::remote::KeyValueClient)

pub mod cache_config;
pub mod codec;
pub mod local;
pub mod remote;

pub use cache_config::{
    CacheConfig, ConfigError, ExportConfig, LocalCacheConfig, RemoteCacheConfig,
};
pub use local::{CacheStats, LocalCache};
pub use remote::RemoteCache;

use crate::query::QueryResult;
use crate::remote::{RemoteError, RemoteStore};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Failed to serialize cached result: {0}")]
    Serialization(String),

    #[error("Corrupt cached result: {0}")]
    Corrupt(String),
}

/// Key/value store for computed query results
pub trait QueryCache: Send + Sync {
    /// Cached result for `key`, or `Ok(None)` on a miss
    fn get(&self, key: &str) -> Result<Option<Arc<QueryResult>>, CacheError>;

    /// Store `result` under `key`, replacing any previous entry
    fn put(&self, key: &str, result: Arc<QueryResult>) -> Result<(), CacheError>;
}

impl<T: QueryCache + ?Sized> QueryCache for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Arc<QueryResult>>, CacheError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, result: Arc<QueryResult>) -> Result<(), CacheError> {
        (**self).put(key, result)
    }
}

/// Build the cache described by `config`
///
/// Returns `None` when caching is disabled. A remote store, when given, takes
/// precedence over the local cache.
pub fn build_cache(
    config: &CacheConfig,
    remote: Option<Arc<dyn RemoteStore>>,
) -> Result<Option<Arc<dyn QueryCache>>, ConfigError> {
    config.validate()?;
    if !config.enabled {
        log::info!("Result caching disabled");
        return Ok(None);
    }

    let cache: Arc<dyn QueryCache> = match remote {
        Some(store) => {
            log::debug!(
                "Using remote result cache with prefix {:?}",
                config.remote.key_prefix
            );
            Arc::new(RemoteCache::from_config(store, &config.remote))
        }
        None => {
            log::debug!(
                "Using local result cache with {} entries",
                config.local.max_entries
            );
            Arc::new(LocalCache::from_config(&config.local))
        }
    };
    Ok(Some(cache))
}
