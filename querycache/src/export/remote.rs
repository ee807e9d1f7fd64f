// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Exports stored as expiring lists of byte records

use super::{read_full, ExportTally, ResultStorageEngine, StorageError, StorageResult, TableExportResult};
use crate::cache::ExportConfig;
use crate::remote::ListClient;
use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;

/// Stores an export as a list of records of at most `buffer_size` bytes
///
/// Records are read back lazily, `batch_size` at a time.
pub struct RemoteResultStorageEngine<C: ListClient + ?Sized> {
    client: Arc<C>,
    expiration: Duration,
    buffer_size: usize,
    batch_size: u64,
}

impl<C: ListClient + ?Sized + 'static> RemoteResultStorageEngine<C> {
    pub fn new(client: Arc<C>, expiration: Duration, buffer_size: usize, batch_size: u64) -> Self {
        Self {
            client,
            expiration,
            buffer_size: buffer_size.max(1),
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(client: Arc<C>, config: &ExportConfig) -> Self {
        Self::new(client, config.expiration, config.buffer_size, config.batch_size)
    }
}

impl<C: ListClient + ?Sized> RemoteResultStorageEngine<C> {
    /// Push `source` to `staging`, returning the record count and totals
    ///
    /// The staged list expires like a finished export, so records left
    /// behind by a failed store are eventually reclaimed.
    fn stage(&self, staging: &[u8], source: &mut dyn Read) -> StorageResult<(u64, ExportTally)> {
        let mut tally = ExportTally::default();
        let mut buf = vec![0u8; self.buffer_size];
        let mut pushed = 0u64;
        loop {
            let n = read_full(source, &mut buf)?;
            if n == 0 {
                break;
            }
            tally.observe(&buf[..n]);
            pushed = self.client.push(staging, &buf[..n])?;
            if pushed == 1 {
                self.client.expire(staging, self.expiration)?;
            }
            if n < buf.len() {
                break;
            }
        }
        Ok((pushed, tally))
    }
}

/// Key the records of an export in progress are written under
fn staging_key(id: &str) -> Vec<u8> {
    format!("{}.staging.{}", id, uuid::Uuid::new_v4()).into_bytes()
}

impl<C: ListClient + ?Sized + 'static> ResultStorageEngine for RemoteResultStorageEngine<C> {
    fn store_results(&self, id: &str, source: &mut dyn Read) -> StorageResult<TableExportResult> {
        if id.is_empty() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let staging = staging_key(id);

        let (pushed, tally) = match self.stage(&staging, source) {
            Ok(staged) => staged,
            Err(e) => {
                if let Err(cleanup) = self.client.delete(&staging) {
                    log::warn!(
                        "Failed to remove staged records of export {}: {}",
                        id,
                        cleanup
                    );
                }
                return Err(e);
            }
        };

        // Readers only ever see a complete export: the staged list replaces
        // the previous one in a single rename
        if pushed > 0 {
            self.client.rename(&staging, id.as_bytes())?;
            self.client.expire(id.as_bytes(), self.expiration)?;
        } else {
            self.client.delete(id.as_bytes())?;
        }

        let result = tally.finish(id);
        log::debug!(
            "Stored export {} as {} records ({} lines, {} bytes)",
            id,
            pushed,
            result.record_count,
            result.byte_count
        );
        Ok(result)
    }

    fn get_results(&self, id: &str) -> StorageResult<Box<dyn Read + Send>> {
        let key = id.as_bytes().to_vec();
        let total = self.client.len(&key)?;
        if total == 0 {
            return Err(StorageError::NoRecords(id.to_string()));
        }
        log::debug!("Reading export {} from {} records", id, total);

        Ok(Box::new(BatchedRecordReader {
            client: Arc::clone(&self.client),
            key,
            total,
            next_index: 0,
            batch_size: self.batch_size,
            pending: VecDeque::new(),
            current: Vec::new(),
            position: 0,
        }))
    }
}

/// Reader that fetches list records on demand
struct BatchedRecordReader<C: ListClient + ?Sized> {
    client: Arc<C>,
    key: Vec<u8>,
    total: u64,
    next_index: u64,
    batch_size: u64,
    pending: VecDeque<Vec<u8>>,
    current: Vec<u8>,
    position: usize,
}

impl<C: ListClient + ?Sized> BatchedRecordReader<C> {
    /// Load the next batch; false once every record has been fetched
    fn fetch_batch(&mut self) -> io::Result<bool> {
        if self.next_index >= self.total {
            return Ok(false);
        }
        let stop = (self.next_index + self.batch_size - 1).min(self.total - 1);
        let records = self
            .client
            .range(&self.key, self.next_index, stop)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, StorageError::Remote(e)))?;
        if records.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "export records expired while reading",
            ));
        }
        self.next_index += records.len() as u64;
        self.pending.extend(records);
        Ok(true)
    }
}

impl<C: ListClient + ?Sized> Read for BatchedRecordReader<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.position >= self.current.len() {
            match self.pending.pop_front() {
                Some(record) => {
                    self.current = record;
                    self.position = 0;
                }
                None => {
                    if !self.fetch_batch()? {
                        return Ok(0);
                    }
                }
            }
        }

        let available = &self.current[self.position..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MemoryStore, RemoteError};

    fn engine(buffer_size: usize, batch_size: u64) -> (Arc<MemoryStore>, RemoteResultStorageEngine<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = RemoteResultStorageEngine::new(
            Arc::clone(&store),
            Duration::from_secs(60),
            buffer_size,
            batch_size,
        );
        (store, engine)
    }

    #[test]
    fn test_multi_batch_round_trip() {
        let (store, engine) = engine(4, 2);
        let data: Vec<u8> = (0..10)
            .flat_map(|i| format!("row{},{}\n", i, i * 7).into_bytes())
            .collect();

        let result = engine.store_results("e1", &mut data.as_slice()).unwrap();
        assert_eq!(result.record_count, 10);
        assert_eq!(result.byte_count, data.len() as u64);
        assert_eq!(store.len(b"e1").unwrap(), (data.len() as u64 + 3) / 4);
        assert!(store.ttl(b"e1").is_some());

        let mut out = Vec::new();
        engine.get_results("e1").unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_zero_records() {
        let (_store, engine) = engine(4, 2);
        assert!(matches!(
            engine.get_results("missing"),
            Err(StorageError::NoRecords(_))
        ));

        engine.store_results("empty", &mut io::empty()).unwrap();
        assert!(matches!(
            engine.get_results("empty"),
            Err(StorageError::NoRecords(_))
        ));
    }

    #[test]
    fn test_store_replaces() {
        let (_store, engine) = engine(2, 8);
        engine.store_results("e1", &mut &b"old old\n"[..]).unwrap();
        engine.store_results("e1", &mut &b"new\n"[..]).unwrap();

        let mut out = Vec::new();
        engine.get_results("e1").unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"new\n");
    }

    #[test]
    fn test_remote_failure() {
        let (store, engine) = engine(4, 2);
        store.set_available(false);
        assert!(matches!(
            engine.store_results("e1", &mut &b"a\n"[..]),
            Err(StorageError::Remote(RemoteError::Disconnected(_)))
        ));
        assert!(matches!(
            engine.get_results("e1"),
            Err(StorageError::Remote(_))
        ));
    }

    /// Yields `chunks` one per read, taking the store down before `fail_at`
    struct FailingSource {
        store: Arc<MemoryStore>,
        chunks: Vec<&'static [u8]>,
        reads: usize,
        fail_at: usize,
    }

    impl Read for FailingSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.reads == self.fail_at {
                self.store.set_available(false);
            }
            let Some(chunk) = self.chunks.get(self.reads) else {
                return Ok(0);
            };
            self.reads += 1;
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            Ok(n)
        }
    }

    #[test]
    fn test_failed_store_leaves_no_partial_export() {
        let (store, engine) = engine(4, 2);
        engine.store_results("e1", &mut &b"old\n"[..]).unwrap();

        let mut source = FailingSource {
            store: Arc::clone(&store),
            chunks: vec![&b"aaaa"[..], &b"bbbb"[..], &b"cc\n"[..]],
            reads: 0,
            fail_at: 1,
        };
        assert!(matches!(
            engine.store_results("e1", &mut source),
            Err(StorageError::Remote(RemoteError::Disconnected(_)))
        ));
        store.set_available(true);

        // The previous export is untouched
        let mut out = Vec::new();
        engine.get_results("e1").unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"old\n");

        // Staged records that could not be removed still expire
        for key in store.keys() {
            assert!(store.ttl(&key).is_some(), "{:?} never expires", key);
        }
    }

    #[test]
    fn test_failed_first_store_has_no_records() {
        let (store, engine) = engine(4, 2);
        let mut source = FailingSource {
            store: Arc::clone(&store),
            chunks: vec![&b"aaaa"[..], &b"bbbb"[..]],
            reads: 0,
            fail_at: 1,
        };
        assert!(engine.store_results("e1", &mut source).is_err());
        store.set_available(true);
        assert!(matches!(
            engine.get_results("e1"),
            Err(StorageError::NoRecords(_))
        ));
    }

    #[test]
    fn test_failure_mid_read() {
        let (store, engine) = engine(1, 1);
        engine.store_results("e1", &mut &b"abc"[..]).unwrap();

        let mut reader = engine.get_results("e1").unwrap();
        let mut first = [0u8; 1];
        reader.read_exact(&mut first).unwrap();
        store.set_available(false);
        assert!(reader.read_exact(&mut first).is_err());
    }
}
