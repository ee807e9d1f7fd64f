// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache configuration and presets

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default key prefix for remote cache entries
pub const DEFAULT_KEY_PREFIX: &str = "querycache:";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid cache configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse cache configuration: {0}")]
    Parse(String),
}

/// Durations are written as whole seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Global cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable/disable result caching entirely
    pub enabled: bool,

    pub local: LocalCacheConfig,

    pub remote: RemoteCacheConfig,

    pub export: ExportConfig,
}

/// In-process cache bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalCacheConfig {
    /// Maximum number of cached results
    pub max_entries: u64,

    /// Entries expire this long after they were written
    #[serde(with = "duration_secs")]
    pub expire_after_write: Duration,
}

/// Shared remote cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteCacheConfig {
    #[serde(with = "duration_secs")]
    pub expiration: Duration,

    /// Prepended to every cache key before it reaches the store
    pub key_prefix: String,
}

/// Export storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory used by the file engine
    pub base_path: PathBuf,

    /// Lifetime of exports held in a remote store
    #[serde(with = "duration_secs")]
    pub expiration: Duration,

    /// Bytes per stored record
    pub buffer_size: usize,

    /// Records fetched per round trip when reading back
    pub batch_size: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            local: LocalCacheConfig::default(),
            remote: RemoteCacheConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Default for LocalCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            expire_after_write: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl Default for RemoteCacheConfig {
    fn default() -> Self {
        Self {
            expiration: Duration::from_secs(1800), // 30 minutes
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_path: std::env::temp_dir().join("querycache-exports"),
            expiration: Duration::from_secs(3600), // 1 hour
            buffer_size: 64 * 1024,
            batch_size: 16,
        }
    }
}

impl CacheConfig {
    /// Local cache only; results never leave the process
    pub fn local_only() -> Self {
        Self {
            remote: RemoteCacheConfig {
                expiration: Duration::from_secs(300),
                ..RemoteCacheConfig::default()
            },
            ..Self::default()
        }
    }

    /// Larger, longer-lived caches for read-heavy dashboards
    pub fn read_optimized() -> Self {
        Self {
            local: LocalCacheConfig {
                max_entries: 10_000,
                expire_after_write: Duration::from_secs(600), // 10 minutes
            },
            remote: RemoteCacheConfig {
                expiration: Duration::from_secs(3600), // 1 hour
                ..RemoteCacheConfig::default()
            },
            ..Self::default()
        }
    }

    /// Configuration for memory-constrained environments
    pub fn memory_constrained() -> Self {
        let mut config = Self::default();
        config.local.max_entries = 200;
        config.local.expire_after_write = Duration::from_secs(120);
        config.export.buffer_size = 16 * 1024;
        config.export.batch_size = 4;
        config
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }

        if self.local.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "local.max_entries must be greater than 0".to_string(),
            ));
        }
        if self.local.expire_after_write.is_zero() {
            return Err(ConfigError::Invalid(
                "local.expire_after_write must be greater than 0".to_string(),
            ));
        }
        if self.remote.expiration.is_zero() {
            return Err(ConfigError::Invalid(
                "remote.expiration must be greater than 0".to_string(),
            ));
        }
        if self.remote.key_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "remote.key_prefix must not contain whitespace: {:?}",
                self.remote.key_prefix
            )));
        }
        if self.export.expiration.is_zero() {
            return Err(ConfigError::Invalid(
                "export.expiration must be greater than 0".to_string(),
            ));
        }
        if self.export.buffer_size == 0 || self.export.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "export.buffer_size and export.batch_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
