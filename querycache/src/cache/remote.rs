// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result cache held in a shared remote store

use super::cache_config::{RemoteCacheConfig, DEFAULT_KEY_PREFIX};
use super::{codec, CacheError, QueryCache};
use crate::query::QueryResult;
use crate::remote::KeyValueClient;
use std::sync::Arc;
use std::time::Duration;

/// Cache over any [`KeyValueClient`]
///
/// Writes fail loudly: a store that cannot be reached is reported to the
/// caller instead of being treated as a miss.
pub struct RemoteCache<C: KeyValueClient> {
    client: C,
    expiration: Duration,
    key_prefix: String,
}

impl<C: KeyValueClient> RemoteCache<C> {
    pub fn new(client: C, expiration: Duration) -> Self {
        Self {
            client,
            expiration,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    pub fn from_config(client: C, config: &RemoteCacheConfig) -> Self {
        Self::new(client, config.expiration).with_key_prefix(config.key_prefix.clone())
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Store key for a cache key
    pub fn store_key(&self, key: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.key_prefix.len() + key.len());
        out.extend_from_slice(self.key_prefix.as_bytes());
        out.extend_from_slice(key.as_bytes());
        out
    }

    pub fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.client.delete(&self.store_key(key))?;
        Ok(())
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: KeyValueClient> QueryCache for RemoteCache<C> {
    fn get(&self, key: &str) -> Result<Option<Arc<QueryResult>>, CacheError> {
        match self.client.get(&self.store_key(key))? {
            Some(bytes) => {
                let result = codec::decode(&bytes)?;
                Ok(Some(Arc::new(result)))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, result: Arc<QueryResult>) -> Result<(), CacheError> {
        let bytes = codec::encode(&result)?;
        log::debug!("Writing {} bytes to remote cache", bytes.len());
        self.client
            .set_with_expiry(&self.store_key(key), &bytes, self.expiration)?;
        Ok(())
    }
}
