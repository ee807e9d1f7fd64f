// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-process remote store for testing and single-node use

use super::{missing_key, KeyValueClient, ListClient, RemoteError, RemoteResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Stored {
    Bytes(Vec<u8>),
    List(Vec<Vec<u8>>),
}

#[derive(Debug, Clone)]
struct Entry {
    data: Stored,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

/// In-memory store with TTL emulation
///
/// Expired entries are treated as absent and dropped on the next write.
/// [`MemoryStore::set_available`] simulates an outage: while unavailable,
/// every call fails with [`RemoteError::Disconnected`].
#[derive(Debug)]
pub struct MemoryStore {
    data: RwLock<HashMap<Vec<u8>, Entry>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        let now = Instant::now();
        self.data
            .read()
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Live keys, in no particular order
    pub fn keys(&self) -> Vec<Vec<u8>> {
        let now = Instant::now();
        self.data
            .read()
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Overwrite a raw value without expiry
    pub fn insert_raw(&self, key: &[u8], value: &[u8]) {
        self.data.write().insert(
            key.to_vec(),
            Entry {
                data: Stored::Bytes(value.to_vec()),
                expires_at: None,
            },
        );
    }

    /// Remaining time to live of a key, if it has one
    pub fn ttl(&self, key: &[u8]) -> Option<Duration> {
        let now = Instant::now();
        self.data
            .read()
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    fn check_available(&self) -> RemoteResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Disconnected("memory store unavailable".to_string()))
        }
    }

    fn purge_expired(data: &mut HashMap<Vec<u8>, Entry>) {
        let now = Instant::now();
        data.retain(|_, entry| !entry.is_expired(now));
    }
}

fn wrong_type(key: &[u8]) -> RemoteError {
    RemoteError::Protocol(format!(
        "wrong value type for key {}",
        String::from_utf8_lossy(key)
    ))
}

impl KeyValueClient for MemoryStore {
    fn get(&self, key: &[u8]) -> RemoteResult<Option<Vec<u8>>> {
        self.check_available()?;
        let now = Instant::now();
        match self.data.read().get(key) {
            Some(entry) if entry.is_expired(now) => Ok(None),
            Some(Entry {
                data: Stored::Bytes(bytes),
                ..
            }) => Ok(Some(bytes.clone())),
            Some(_) => Err(wrong_type(key)),
            None => Ok(None),
        }
    }

    fn set_with_expiry(&self, key: &[u8], value: &[u8], ttl: Duration) -> RemoteResult<()> {
        self.check_available()?;
        let mut data = self.data.write();
        Self::purge_expired(&mut data);
        data.insert(
            key.to_vec(),
            Entry {
                data: Stored::Bytes(value.to_vec()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> RemoteResult<()> {
        self.check_available()?;
        self.data.write().remove(key);
        Ok(())
    }
}

impl ListClient for MemoryStore {
    fn push(&self, key: &[u8], record: &[u8]) -> RemoteResult<u64> {
        self.check_available()?;
        let mut data = self.data.write();
        Self::purge_expired(&mut data);
        let entry = data.entry(key.to_vec()).or_insert_with(|| Entry {
            data: Stored::List(Vec::new()),
            expires_at: None,
        });
        match &mut entry.data {
            Stored::List(records) => {
                records.push(record.to_vec());
                Ok(records.len() as u64)
            }
            Stored::Bytes(_) => Err(wrong_type(key)),
        }
    }

    fn len(&self, key: &[u8]) -> RemoteResult<u64> {
        self.check_available()?;
        let now = Instant::now();
        match self.data.read().get(key) {
            Some(entry) if entry.is_expired(now) => Ok(0),
            Some(Entry {
                data: Stored::List(records),
                ..
            }) => Ok(records.len() as u64),
            Some(_) => Err(wrong_type(key)),
            None => Ok(0),
        }
    }

    fn range(&self, key: &[u8], start: u64, stop: u64) -> RemoteResult<Vec<Vec<u8>>> {
        self.check_available()?;
        let now = Instant::now();
        match self.data.read().get(key) {
            Some(entry) if entry.is_expired(now) => Ok(Vec::new()),
            Some(Entry {
                data: Stored::List(records),
                ..
            }) => {
                let len = records.len() as u64;
                if start >= len || start > stop {
                    return Ok(Vec::new());
                }
                let end = stop.min(len - 1);
                Ok(records[start as usize..=end as usize].to_vec())
            }
            Some(_) => Err(wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    fn expire(&self, key: &[u8], ttl: Duration) -> RemoteResult<()> {
        self.check_available()?;
        if let Some(entry) = self.data.write().get_mut(key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    fn rename(&self, from: &[u8], to: &[u8]) -> RemoteResult<()> {
        self.check_available()?;
        let mut data = self.data.write();
        match data.remove(from) {
            Some(entry) if !entry.is_expired(Instant::now()) => {
                data.insert(to.to_vec(), entry);
                Ok(())
            }
            _ => Err(missing_key(from)),
        }
    }

    fn delete(&self, key: &[u8]) -> RemoteResult<()> {
        KeyValueClient::delete(self, key)
    }
}
