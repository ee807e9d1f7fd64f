//! Test utilities for QueryCache integration tests
//!
//! - player_stats: a small analytics schema with paths, queries and rows
//! - init_logging: route `log` output through the test harness

#![allow(dead_code)]

pub mod player_stats;

/// Initialize env_logger once per test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
