// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Connected clients for remote shared stores
//!
//! Remote caches and export engines talk to a shared store through two small
//! client contracts: [`KeyValueClient`] for expiring byte values and
//! [`ListClient`] for expiring lists of byte records.
//!
//! # Architecture
//!
//! ```text
//! RemoteCache / RemoteResultStorageEngine
//!     ↓
//! KeyValueClient / ListClient
//!     ↓
//! Concrete stores (memory, sled, redis)
//! ```
//!
//! Clients are internally synchronized and shared by reference.

pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis;
#[cfg(feature = "sled-backend")]
pub mod sled;

pub use memory::MemoryStore;
#[cfg(feature = "sled-backend")]
pub use self::sled::SledStore;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a remote store client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The store could not be reached
    #[error("Remote store disconnected: {0}")]
    Disconnected(String),

    /// The store answered with something unexpected
    #[error("Remote protocol error: {0}")]
    Protocol(String),

    /// Store-specific failure
    #[error("Remote backend error: {0}")]
    Backend(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

pub(crate) fn missing_key(key: &[u8]) -> RemoteError {
    RemoteError::Protocol(format!("no such key: {}", String::from_utf8_lossy(key)))
}

/// Expiring key/value access
pub trait KeyValueClient: Send + Sync {
    /// Value for `key`; `Ok(None)` only when the store confirms absence
    fn get(&self, key: &[u8]) -> RemoteResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, expiring after `ttl`
    fn set_with_expiry(&self, key: &[u8], value: &[u8], ttl: Duration) -> RemoteResult<()>;

    fn delete(&self, key: &[u8]) -> RemoteResult<()>;
}

/// Expiring list-of-records access
pub trait ListClient: Send + Sync {
    /// Append a record, returning the new list length
    fn push(&self, key: &[u8], record: &[u8]) -> RemoteResult<u64>;

    /// Number of records; zero for a missing key
    fn len(&self, key: &[u8]) -> RemoteResult<u64>;

    /// Records `start..=stop`, clamped to the list length
    fn range(&self, key: &[u8], start: u64, stop: u64) -> RemoteResult<Vec<Vec<u8>>>;

    /// Expire the whole list after `ttl`
    fn expire(&self, key: &[u8], ttl: Duration) -> RemoteResult<()>;

    /// Atomically replace `to` with the list at `from`, keeping its expiry
    ///
    /// Fails with [`RemoteError::Protocol`] when `from` does not exist.
    fn rename(&self, from: &[u8], to: &[u8]) -> RemoteResult<()>;

    fn delete(&self, key: &[u8]) -> RemoteResult<()>;
}

/// A store offering both client contracts
pub trait RemoteStore: KeyValueClient + ListClient {}

impl<T: KeyValueClient + ListClient + ?Sized> RemoteStore for T {}

// Shared handles forward to the underlying client
impl<C: KeyValueClient + ?Sized> KeyValueClient for Arc<C> {
    fn get(&self, key: &[u8]) -> RemoteResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set_with_expiry(&self, key: &[u8], value: &[u8], ttl: Duration) -> RemoteResult<()> {
        (**self).set_with_expiry(key, value, ttl)
    }

    fn delete(&self, key: &[u8]) -> RemoteResult<()> {
        KeyValueClient::delete(&**self, key)
    }
}

impl<C: ListClient + ?Sized> ListClient for Arc<C> {
    fn push(&self, key: &[u8], record: &[u8]) -> RemoteResult<u64> {
        (**self).push(key, record)
    }

    fn len(&self, key: &[u8]) -> RemoteResult<u64> {
        (**self).len(key)
    }

    fn range(&self, key: &[u8], start: u64, stop: u64) -> RemoteResult<Vec<Vec<u8>>> {
        (**self).range(key, start, stop)
    }

    fn expire(&self, key: &[u8], ttl: Duration) -> RemoteResult<()> {
        (**self).expire(key, ttl)
    }

    fn rename(&self, from: &[u8], to: &[u8]) -> RemoteResult<()> {
        (**self).rename(from, to)
    }

    fn delete(&self, key: &[u8]) -> RemoteResult<()> {
        ListClient::delete(&**self, key)
    }
}

/// Remote store implementation to open
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// In-process store, lost on exit
    Memory,
    /// Embedded sled database at a filesystem location
    #[default]
    Sled,
    /// Redis server at a `redis://` URL
    Redis,
}

impl std::str::FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(BackendType::Memory),
            "sled" => Ok(BackendType::Sled),
            "redis" => Ok(BackendType::Redis),
            _ => Err(format!(
                "Unknown backend type: {}. Valid options: memory, sled, redis",
                s
            )),
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackendType::Memory => "memory",
            BackendType::Sled => "sled",
            BackendType::Redis => "redis",
        };
        write!(f, "{}", name)
    }
}

/// Open a remote store of the given type
///
/// `location` is a directory for sled and a URL for redis; it is ignored for
/// the memory store.
pub fn open_backend(backend: BackendType, location: &str) -> RemoteResult<Arc<dyn RemoteStore>> {
    log::debug!("Opening {} remote store", backend);
    match backend {
        BackendType::Memory => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "sled-backend")]
        BackendType::Sled => Ok(Arc::new(SledStore::open(location)?)),
        #[cfg(feature = "redis-backend")]
        BackendType::Redis => Ok(Arc::new(self::redis::open_client(location)?)),
        #[allow(unreachable_patterns)]
        other => {
            let _ = location;
            Err(RemoteError::Backend(format!(
                "{} backend not enabled in this build",
                other
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_parse() {
        assert_eq!("sled".parse::<BackendType>(), Ok(BackendType::Sled));
        assert_eq!("REDIS".parse::<BackendType>(), Ok(BackendType::Redis));
        assert!("rocksdb".parse::<BackendType>().is_err());
        assert_eq!(BackendType::default().to_string(), "sled");
    }

    #[test]
    fn test_open_memory_backend() {
        let store = open_backend(BackendType::Memory, "").unwrap();
        store
            .set_with_expiry(b"k", b"v", Duration::from_secs(60))
            .unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[cfg(feature = "sled-backend")]
    #[test]
    fn test_open_sled_backend() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let location = temp_dir.path().to_string_lossy().to_string();
        let store = open_backend(BackendType::Sled, &location).unwrap();
        assert_eq!(store.push(b"list", b"a").unwrap(), 1);
        assert_eq!(store.len(b"list").unwrap(), 1);
    }
}
