// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Byte format for results held in a remote store
//!
//! ```text
//! +---------+-------------+------------------+
//! | version | crc32 (BE)  | bincode body     |
//! | 1 byte  | 4 bytes     | variable         |
//! +---------+-------------+------------------+
//! ```

use super::CacheError;
use crate::query::QueryResult;

pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 5;

pub fn encode(result: &QueryResult) -> Result<Vec<u8>, CacheError> {
    let body = bincode::serialize(result).map_err(|e| CacheError::Serialization(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&crc32fast::hash(&body).to_be_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<QueryResult, CacheError> {
    if bytes.len() < HEADER_LEN {
        return Err(CacheError::Corrupt(format!(
            "value too short ({} bytes)",
            bytes.len()
        )));
    }
    if bytes[0] != FORMAT_VERSION {
        return Err(CacheError::Corrupt(format!(
            "unsupported format version {}",
            bytes[0]
        )));
    }

    let expected = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    let body = &bytes[HEADER_LEN..];
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(CacheError::Corrupt(format!(
            "checksum mismatch: expected {:08x}, got {:08x}",
            expected, actual
        )));
    }

    bincode::deserialize(body).map_err(|e| CacheError::Corrupt(e.to_string()))
}
