// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Redis client binding
//!
//! Every call opens a connection from the shared `redis::Client`; pooling and
//! timeouts are left to the client configuration.

use super::{KeyValueClient, ListClient, RemoteError, RemoteResult};
use std::time::Duration;

/// Map a redis error without echoing connection details
fn remote_error(e: ::redis::RedisError) -> RemoteError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout()
    {
        return RemoteError::Disconnected(e.category().to_string());
    }
    match e.kind() {
        ::redis::ErrorKind::TypeError
        | ::redis::ErrorKind::ResponseError
        | ::redis::ErrorKind::ExtensionError => RemoteError::Protocol(e.to_string()),
        _ => RemoteError::Backend(e.category().to_string()),
    }
}

/// Open a client for a `redis://` URL; no connection is made until first use
pub fn open_client(url: &str) -> RemoteResult<::redis::Client> {
    ::redis::Client::open(url).map_err(remote_error)
}

fn connection(client: &::redis::Client) -> RemoteResult<::redis::Connection> {
    client.get_connection().map_err(remote_error)
}

fn millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

impl KeyValueClient for ::redis::Client {
    fn get(&self, key: &[u8]) -> RemoteResult<Option<Vec<u8>>> {
        let mut con = connection(self)?;
        ::redis::cmd("GET")
            .arg(key)
            .query::<Option<Vec<u8>>>(&mut con)
            .map_err(remote_error)
    }

    fn set_with_expiry(&self, key: &[u8], value: &[u8], ttl: Duration) -> RemoteResult<()> {
        let mut con = connection(self)?;
        ::redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis(ttl))
            .query::<()>(&mut con)
            .map_err(remote_error)
    }

    fn delete(&self, key: &[u8]) -> RemoteResult<()> {
        let mut con = connection(self)?;
        ::redis::cmd("DEL")
            .arg(key)
            .query::<()>(&mut con)
            .map_err(remote_error)
    }
}

impl ListClient for ::redis::Client {
    fn push(&self, key: &[u8], record: &[u8]) -> RemoteResult<u64> {
        let mut con = connection(self)?;
        ::redis::cmd("RPUSH")
            .arg(key)
            .arg(record)
            .query::<u64>(&mut con)
            .map_err(remote_error)
    }

    fn len(&self, key: &[u8]) -> RemoteResult<u64> {
        let mut con = connection(self)?;
        ::redis::cmd("LLEN")
            .arg(key)
            .query::<u64>(&mut con)
            .map_err(remote_error)
    }

    fn range(&self, key: &[u8], start: u64, stop: u64) -> RemoteResult<Vec<Vec<u8>>> {
        let to_index = |i: u64| i64::try_from(i).unwrap_or(i64::MAX);
        let mut con = connection(self)?;
        ::redis::cmd("LRANGE")
            .arg(key)
            .arg(to_index(start))
            .arg(to_index(stop))
            .query::<Vec<Vec<u8>>>(&mut con)
            .map_err(remote_error)
    }

    fn expire(&self, key: &[u8], ttl: Duration) -> RemoteResult<()> {
        let mut con = connection(self)?;
        ::redis::cmd("PEXPIRE")
            .arg(key)
            .arg(millis(ttl))
            .query::<()>(&mut con)
            .map_err(remote_error)
    }

    fn rename(&self, from: &[u8], to: &[u8]) -> RemoteResult<()> {
        let mut con = connection(self)?;
        ::redis::cmd("RENAME")
            .arg(from)
            .arg(to)
            .query::<()>(&mut con)
            .map_err(remote_error)
    }

    fn delete(&self, key: &[u8]) -> RemoteResult<()> {
        KeyValueClient::delete(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(open_client("not a url").is_err());
    }

    #[test]
    fn test_unreachable_server_is_disconnected() {
        // Port 1 is never a redis server
        let client = open_client("redis://127.0.0.1:1/").unwrap();
        assert!(matches!(
            client.get(b"key"),
            Err(RemoteError::Disconnected(_))
        ));
    }
}
