// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sled-backed store
//!
//! Values carry an 8-byte big-endian expiry header (milliseconds since the
//! Unix epoch, zero for none). Lists keep their records in a separate tree
//! keyed by `len(key) | key | index` and their length and expiry in a
//! metadata tree. Expired entries are swept every [`SWEEP_INTERVAL`] writes.

use super::{missing_key, KeyValueClient, ListClient, RemoteError, RemoteResult};
use parking_lot::Mutex;
use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult, TransactionError, Transactional};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Writes between sweeps of expired entries
pub const SWEEP_INTERVAL: u64 = 64;

const VALUES_TREE: &str = "values";
const LIST_ITEMS_TREE: &str = "list_items";
const LIST_META_TREE: &str = "list_meta";

fn backend_error(e: sled::Error) -> RemoteError {
    match &e {
        sled::Error::Io(io) => RemoteError::Disconnected(io.to_string()),
        sled::Error::Corruption { .. } => RemoteError::Protocol(e.to_string()),
        _ => RemoteError::Backend(e.to_string()),
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn expiry_after(ttl: Duration) -> u64 {
    now_millis().saturating_add(ttl.as_millis() as u64).max(1)
}

fn is_expired(expires_at: u64) -> bool {
    expires_at != 0 && expires_at <= now_millis()
}

fn read_u64(bytes: &[u8]) -> RemoteResult<u64> {
    let array: [u8; 8] = bytes
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| RemoteError::Protocol("truncated sled record".to_string()))?;
    Ok(u64::from_be_bytes(array))
}

/// List metadata: record count and expiry
#[derive(Debug, Clone, Copy)]
struct ListMeta {
    len: u64,
    expires_at: u64,
}

impl ListMeta {
    fn decode(bytes: &[u8]) -> RemoteResult<Self> {
        if bytes.len() != 16 {
            return Err(RemoteError::Protocol("malformed list metadata".to_string()));
        }
        Ok(Self {
            len: read_u64(&bytes[..8])?,
            expires_at: read_u64(&bytes[8..])?,
        })
    }

    fn encode(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.len.to_be_bytes());
        out[8..].copy_from_slice(&self.expires_at.to_be_bytes());
        out
    }
}

fn item_prefix(key: &[u8]) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(4 + key.len());
    prefix.extend_from_slice(&(key.len() as u32).to_be_bytes());
    prefix.extend_from_slice(key);
    prefix
}

fn item_key(key: &[u8], index: u64) -> Vec<u8> {
    let mut out = item_prefix(key);
    out.extend_from_slice(&index.to_be_bytes());
    out
}

/// Store persisted in a sled database
pub struct SledStore {
    db: sled::Db,
    values: sled::Tree,
    list_items: sled::Tree,
    list_meta: sled::Tree,
    // Serializes list mutations that touch both list trees
    list_lock: Mutex<()>,
    writes: AtomicU64,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> RemoteResult<Self> {
        let db = sled::open(path).map_err(backend_error)?;
        Self::from_db(db)
    }

    /// Store backed by a temporary database removed on drop
    pub fn temporary() -> RemoteResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(backend_error)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> RemoteResult<Self> {
        Ok(Self {
            values: db.open_tree(VALUES_TREE).map_err(backend_error)?,
            list_items: db.open_tree(LIST_ITEMS_TREE).map_err(backend_error)?,
            list_meta: db.open_tree(LIST_META_TREE).map_err(backend_error)?,
            db,
            list_lock: Mutex::new(()),
            writes: AtomicU64::new(0),
        })
    }

    /// Remove every expired value and list, returning how many were removed
    pub fn purge_expired(&self) -> RemoteResult<usize> {
        let mut removed = 0;
        for entry in self.values.iter() {
            let (key, stored) = entry.map_err(backend_error)?;
            if is_expired(read_u64(&stored)?) {
                // Skip values rewritten since they were read
                let swapped = self
                    .values
                    .compare_and_swap(&key, Some(&stored[..]), None::<&[u8]>)
                    .map_err(backend_error)?;
                if swapped.is_ok() {
                    removed += 1;
                }
            }
        }

        let _guard = self.list_lock.lock();
        let mut expired_lists = Vec::new();
        for entry in self.list_meta.iter() {
            let (key, meta) = entry.map_err(backend_error)?;
            if is_expired(ListMeta::decode(&meta)?.expires_at) {
                expired_lists.push(key);
            }
        }
        for key in &expired_lists {
            self.remove_list(key)?;
        }
        removed += expired_lists.len();

        if removed > 0 {
            log::debug!("Reclaimed {} expired sled entries", removed);
        }
        Ok(removed)
    }

    /// Count a write and sweep when due; the write itself already succeeded
    fn note_write(&self) {
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            if let Err(e) = self.purge_expired() {
                log::warn!("Failed to sweep expired sled entries: {}", e);
            }
        }
    }

    pub fn flush(&self) -> RemoteResult<()> {
        self.db.flush().map_err(backend_error)?;
        Ok(())
    }

    fn live_meta(&self, key: &[u8]) -> RemoteResult<Option<ListMeta>> {
        match self.list_meta.get(key).map_err(backend_error)? {
            Some(bytes) => {
                let meta = ListMeta::decode(&bytes)?;
                if is_expired(meta.expires_at) {
                    Ok(None)
                } else {
                    Ok(Some(meta))
                }
            }
            None => Ok(None),
        }
    }

    fn push_locked(&self, key: &[u8], record: &[u8]) -> RemoteResult<u64> {
        let _guard = self.list_lock.lock();
        let meta = match self.list_meta.get(key).map_err(backend_error)? {
            Some(bytes) => {
                let meta = ListMeta::decode(&bytes)?;
                if is_expired(meta.expires_at) {
                    self.remove_list(key)?;
                    ListMeta { len: 0, expires_at: 0 }
                } else {
                    meta
                }
            }
            None => ListMeta { len: 0, expires_at: 0 },
        };

        self.list_items
            .insert(item_key(key, meta.len), record)
            .map_err(backend_error)?;
        let updated = ListMeta {
            len: meta.len + 1,
            ..meta
        };
        self.list_meta
            .insert(key, &updated.encode()[..])
            .map_err(backend_error)?;
        Ok(updated.len)
    }

    fn remove_list(&self, key: &[u8]) -> RemoteResult<()> {
        self.list_meta.remove(key).map_err(backend_error)?;
        for item in self.list_items.scan_prefix(item_prefix(key)).keys() {
            let item = item.map_err(backend_error)?;
            self.list_items.remove(item).map_err(backend_error)?;
        }
        Ok(())
    }
}

impl KeyValueClient for SledStore {
    fn get(&self, key: &[u8]) -> RemoteResult<Option<Vec<u8>>> {
        let Some(stored) = self.values.get(key).map_err(backend_error)? else {
            return Ok(None);
        };
        let expires_at = read_u64(&stored)?;
        if is_expired(expires_at) {
            self.values.remove(key).map_err(backend_error)?;
            return Ok(None);
        }
        Ok(Some(stored[8..].to_vec()))
    }

    fn set_with_expiry(&self, key: &[u8], value: &[u8], ttl: Duration) -> RemoteResult<()> {
        let mut stored = Vec::with_capacity(8 + value.len());
        stored.extend_from_slice(&expiry_after(ttl).to_be_bytes());
        stored.extend_from_slice(value);
        self.values.insert(key, stored).map_err(backend_error)?;
        self.note_write();
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> RemoteResult<()> {
        self.values.remove(key).map_err(backend_error)?;
        Ok(())
    }
}

impl ListClient for SledStore {
    fn push(&self, key: &[u8], record: &[u8]) -> RemoteResult<u64> {
        let len = self.push_locked(key, record)?;
        self.note_write();
        Ok(len)
    }

    fn len(&self, key: &[u8]) -> RemoteResult<u64> {
        Ok(self.live_meta(key)?.map_or(0, |meta| meta.len))
    }

    fn range(&self, key: &[u8], start: u64, stop: u64) -> RemoteResult<Vec<Vec<u8>>> {
        let Some(meta) = self.live_meta(key)? else {
            return Ok(Vec::new());
        };
        if start >= meta.len || start > stop {
            return Ok(Vec::new());
        }
        let end = stop.min(meta.len - 1);

        let mut records = Vec::with_capacity((end - start + 1) as usize);
        for (_, value) in self
            .list_items
            .range(item_key(key, start)..=item_key(key, end))
            .map(|r| r.map_err(backend_error))
            .collect::<RemoteResult<Vec<_>>>()?
        {
            records.push(value.to_vec());
        }
        Ok(records)
    }

    fn expire(&self, key: &[u8], ttl: Duration) -> RemoteResult<()> {
        let _guard = self.list_lock.lock();
        if let Some(meta) = self.live_meta(key)? {
            let updated = ListMeta {
                expires_at: expiry_after(ttl),
                ..meta
            };
            self.list_meta
                .insert(key, &updated.encode()[..])
                .map_err(backend_error)?;
        }
        Ok(())
    }

    fn rename(&self, from: &[u8], to: &[u8]) -> RemoteResult<()> {
        let _guard = self.list_lock.lock();
        let meta = self.live_meta(from)?.ok_or_else(|| missing_key(from))?;
        if from == to {
            return Ok(());
        }

        (&self.list_items, &self.list_meta)
            .transaction(|(items, metas)| -> ConflictableTransactionResult<(), RemoteError> {
                let replaced = match metas.get(to)? {
                    Some(bytes) => ListMeta::decode(&bytes)
                        .map_err(ConflictableTransactionError::Abort)?
                        .len,
                    None => 0,
                };
                for index in 0..replaced {
                    items.remove(item_key(to, index))?;
                }
                for index in 0..meta.len {
                    if let Some(record) = items.remove(item_key(from, index))? {
                        items.insert(item_key(to, index), record)?;
                    }
                }
                metas.remove(from)?;
                metas.insert(to, &meta.encode()[..])?;
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => backend_error(e),
            })
    }

    fn delete(&self, key: &[u8]) -> RemoteResult<()> {
        let _guard = self.list_lock.lock();
        self.remove_list(key)
    }
}
