// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "querycache")]
#[command(about = "Cache keys, result exports and cache configuration", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (overridden by --verbose)
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the cache key of a JSON query description
    Key {
        /// Path to the query JSON file
        query: PathBuf,

        /// Show the key fragment contributed by each query section
        #[arg(long)]
        explain: bool,
    },

    /// Store and read back exported results
    Export {
        #[command(subcommand)]
        action: ExportAction,
    },

    /// Inspect cache configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ExportAction {
    /// Store stdin or a file as an export
    Store {
        #[command(flatten)]
        target: ExportTarget,

        /// Export id; a random id is generated when omitted
        #[arg(long)]
        id: Option<String>,

        /// Read from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Write a stored export to stdout
    Get {
        #[command(flatten)]
        target: ExportTarget,

        #[arg(long)]
        id: String,
    },
}

/// Where exports live
#[derive(clap::Args, Debug)]
pub struct ExportTarget {
    /// Export directory, or sled database directory for `--backend sled`
    #[arg(long)]
    pub dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "file")]
    pub backend: ExportBackend,

    /// Server URL for `--backend redis`
    #[arg(long, default_value = "redis://127.0.0.1/")]
    pub url: String,

    /// File extension appended by the file backend
    #[arg(long)]
    pub extension: Option<String>,

    /// Cache configuration supplying export defaults
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportBackend {
    File,
    Sled,
    Redis,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate a cache configuration file
    Check {
        config: PathBuf,
    },

    /// Print a preset configuration as JSON
    Show {
        #[arg(value_enum, default_value = "default")]
        preset: Preset,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    Default,
    LocalOnly,
    ReadOptimized,
    MemoryConstrained,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export_store() {
        let cli = Cli::try_parse_from([
            "querycache", "export", "store", "--dir", "/tmp/x", "--id", "e1", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Export {
                action: ExportAction::Store { target, id, input },
            } => {
                assert_eq!(target.backend, ExportBackend::File);
                assert_eq!(id.as_deref(), Some("e1"));
                assert!(input.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_key_explain() {
        let cli = Cli::try_parse_from(["querycache", "key", "q.json", "--explain"]).unwrap();
        assert!(matches!(cli.command, Commands::Key { explain: true, .. }));
    }

    #[test]
    fn test_parse_log_level() {
        let cli = Cli::try_parse_from(["querycache", "--log-level", "info", "version"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Info));
    }
}
