// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-process result cache

use super::cache_config::LocalCacheConfig;
use super::{CacheError, QueryCache};
use crate::query::QueryResult;
use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Point-in-time cache counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
}

impl CacheStats {
    pub fn requests(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.requests();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
}

/// Bounded, expire-after-write cache shared by all threads of a process
///
/// Lookups never block on other callers and never touch the network.
#[derive(Clone)]
pub struct LocalCache {
    cache: Cache<String, Arc<QueryResult>>,
    counters: Arc<Counters>,
}

impl LocalCache {
    pub fn new(max_entries: u64, expire_after_write: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(expire_after_write)
                .build(),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn from_config(config: &LocalCacheConfig) -> Self {
        Self::new(config.max_entries, config.expire_after_write)
    }

    pub fn invalidate(&self, key: &str) {
        self.cache.invalidate(key);
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }

    /// Number of live entries after pending maintenance has run
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            puts: self.counters.puts.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("entries", &self.cache.entry_count())
            .field("stats", &self.stats())
            .finish()
    }
}

impl QueryCache for LocalCache {
    fn get(&self, key: &str) -> Result<Option<Arc<QueryResult>>, CacheError> {
        let found = self.cache.get(key);
        let counter = if found.is_some() {
            &self.counters.hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(found)
    }

    fn put(&self, key: &str, result: Arc<QueryResult>) -> Result<(), CacheError> {
        self.cache.insert(key.to_string(), result);
        self.counters.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Row;
    use std::thread;

    fn result(n: i64) -> Arc<QueryResult> {
        Arc::new(QueryResult::new(vec![Row::new().with("n", n)]))
    }

    #[test]
    fn test_put_get_and_stats() {
        let cache = LocalCache::new(100, Duration::from_secs(60));
        assert!(cache.get("k").unwrap().is_none());

        let stored = result(1);
        cache.put("k", stored.clone()).unwrap();
        let found = cache.get("k").unwrap().unwrap();
        assert!(Arc::ptr_eq(&found, &stored));

        let stats = cache.stats();
        assert_eq!(stats, CacheStats { hits: 1, misses: 1, puts: 1 });
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_last_write_wins() {
        let cache = LocalCache::new(100, Duration::from_secs(60));
        cache.put("k", result(1)).unwrap();
        cache.put("k", result(2)).unwrap();
        assert_eq!(*cache.get("k").unwrap().unwrap(), *result(2));
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn test_expire_after_write() {
        let cache = LocalCache::new(100, Duration::from_millis(20));
        cache.put("k", result(1)).unwrap();
        thread::sleep(Duration::from_millis(60));
        assert!(cache.get("k").unwrap().is_none());
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = LocalCache::new(100, Duration::from_secs(60));
        cache.put("a", result(1)).unwrap();
        cache.put("b", result(2)).unwrap();

        cache.invalidate("a");
        assert!(cache.get("a").unwrap().is_none());
        assert!(cache.get("b").unwrap().is_some());

        cache.clear();
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn test_bounded() {
        let cache = LocalCache::new(10, Duration::from_secs(60));
        for i in 0..200 {
            cache.put(&format!("k{}", i), result(i)).unwrap();
        }
        assert!(cache.entry_count() <= 10);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = LocalCache::new(1000, Duration::from_secs(60));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("k{}", i % 10);
                        cache.put(&key, result(t)).unwrap();
                        assert!(cache.get(&key).unwrap().is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.stats().puts, 400);
        assert_eq!(cache.stats().hits, 400);
    }
}
