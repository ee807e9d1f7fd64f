// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage for large exported results
//!
//! An export is an opaque byte stream, usually newline-delimited records,
//! stored and retrieved by id. Producers hand the engine a reader; consumers
//! get a reader back and never see how the bytes were stored.

pub mod file;
pub mod remote;

pub use file::FileResultStorageEngine;
pub use remote::RemoteResultStorageEngine;

use crate::remote::RemoteError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Export not found: {0}")]
    NotFound(String),

    #[error("Export has no records: {0}")]
    NoRecords(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Summary of a completed export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableExportResult {
    pub export_id: String,
    /// Number of newline-terminated records
    pub record_count: u64,
    pub byte_count: u64,
    pub completed_at: DateTime<Utc>,
}

/// Byte-stream storage keyed by export id
pub trait ResultStorageEngine: Send + Sync {
    /// Drain `source` into storage under `id`, replacing any previous export
    fn store_results(&self, id: &str, source: &mut dyn Read) -> StorageResult<TableExportResult>;

    /// Reader over the bytes stored under `id`
    fn get_results(&self, id: &str) -> StorageResult<Box<dyn Read + Send>>;
}

/// Fresh random export id
pub fn new_export_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Running byte and record totals for an export in progress
#[derive(Debug, Default)]
pub(crate) struct ExportTally {
    bytes: u64,
    records: u64,
}

impl ExportTally {
    pub(crate) fn observe(&mut self, chunk: &[u8]) {
        self.bytes += chunk.len() as u64;
        self.records += chunk.iter().filter(|&&b| b == b'\n').count() as u64;
    }

    pub(crate) fn finish(self, export_id: &str) -> TableExportResult {
        TableExportResult {
            export_id: export_id.to_string(),
            record_count: self.records,
            byte_count: self.bytes,
            completed_at: Utc::now(),
        }
    }
}

/// Fill `buf` from `source`, stopping early only at end of input
pub(crate) fn read_full(source: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
