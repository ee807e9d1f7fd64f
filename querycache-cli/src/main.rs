// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! QueryCache CLI entry point

use clap::Parser;
use colored::Colorize;

mod cli;
use cli::{Cli, Commands, OutputFormatter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --verbose wins over --log-level; RUST_LOG still applies per module
    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else if let Some(level) = cli.log_level {
        level.to_level_filter()
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let outcome = match cli.command {
        Commands::Version => {
            println!("{} {}", "QueryCache".bold().green(), querycache::VERSION);
            println!("Deterministic query cache keys and result caching");
            Ok(())
        }

        Commands::Key { query, explain } => cli::handle_key(&query, explain),

        Commands::Export { action } => cli::handle_export(action),

        Commands::Config { action } => cli::handle_config(action),
    };

    if let Err(e) = &outcome {
        eprintln!("{}", OutputFormatter::format_error(&e.to_string()));
        std::process::exit(1);
    }
    outcome
}
