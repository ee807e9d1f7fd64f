// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for QueryCache
//!
//! Prints cache keys for JSON query descriptions, stores and reads back
//! result exports, and validates cache configuration files.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands};
pub use handlers::{handle_config, handle_export, handle_key};
pub use output::OutputFormatter;
