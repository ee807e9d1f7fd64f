// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Command handlers

use super::commands::{ConfigAction, ExportAction, ExportBackend, ExportTarget, Preset};
use super::output::OutputFormatter;
use colored::*;
use querycache::cache::CacheConfig;
use querycache::executor::cache_key;
use querycache::export::{
    new_export_id, FileResultStorageEngine, RemoteResultStorageEngine, ResultStorageEngine,
};
use querycache::query::{Query, QueryKeyExtractor};
use querycache::remote::{open_backend, BackendType};
use std::error::Error;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn load_query(path: &Path) -> CliResult<Query> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("cannot read query file {}: {}", path.display(), e))?;
    let query: Query = serde_json::from_str(&json)
        .map_err(|e| format!("invalid query JSON in {}: {}", path.display(), e))?;
    query.validate()?;
    Ok(query)
}

fn load_config(path: &Path) -> CliResult<CacheConfig> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("cannot read configuration {}: {}", path.display(), e))?;
    Ok(CacheConfig::from_json(&json)?)
}

pub fn handle_key(query_path: &Path, explain: bool) -> CliResult<()> {
    let query = load_query(query_path)?;
    log::debug!("Extracting key for table {}", query.table.id);

    if explain {
        let explanation = QueryKeyExtractor::explain_key(&query);
        print!(
            "{}",
            OutputFormatter::format_explanation(&explanation, &cache_key(&query))
        );
    } else {
        println!("{}", QueryKeyExtractor::extract_key(&query));
    }
    Ok(())
}

/// Build the storage engine selected by `target`
fn open_engine(target: &ExportTarget) -> CliResult<Box<dyn ResultStorageEngine>> {
    let config = match &target.config {
        Some(path) => load_config(path)?,
        None => CacheConfig::default(),
    };
    let dir = target
        .dir
        .clone()
        .unwrap_or_else(|| config.export.base_path.clone());

    let engine: Box<dyn ResultStorageEngine> = match target.backend {
        ExportBackend::File => {
            let engine = FileResultStorageEngine::new(&dir)?;
            match &target.extension {
                Some(extension) => Box::new(engine.with_extension(extension.clone())),
                None => Box::new(engine),
            }
        }
        ExportBackend::Sled => {
            let store = open_backend(BackendType::Sled, &dir.to_string_lossy())?;
            Box::new(RemoteResultStorageEngine::from_config(store, &config.export))
        }
        ExportBackend::Redis => {
            let store = open_backend(BackendType::Redis, &target.url)?;
            Box::new(RemoteResultStorageEngine::from_config(store, &config.export))
        }
    };
    Ok(engine)
}

pub fn handle_export(action: ExportAction) -> CliResult<()> {
    match action {
        ExportAction::Store { target, id, input } => {
            let engine = open_engine(&target)?;
            let id = id.unwrap_or_else(new_export_id);
            let result = match input {
                Some(path) => {
                    let mut file = File::open(&path)
                        .map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
                    engine.store_results(&id, &mut file)?
                }
                None => engine.store_results(&id, &mut io::stdin().lock())?,
            };
            eprint!("{}", OutputFormatter::format_export(&result));
            Ok(())
        }
        ExportAction::Get { target, id } => {
            let engine = open_engine(&target)?;
            let mut reader = engine.get_results(&id)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let copied = io::copy(&mut reader, &mut out)?;
            out.flush()?;
            log::debug!("Wrote {} bytes of export {}", copied, id);
            Ok(())
        }
    }
}

pub fn handle_config(action: ConfigAction) -> CliResult<()> {
    match action {
        ConfigAction::Check { config } => {
            let parsed = load_config(&config)?;
            print!("{}", OutputFormatter::format_config(&parsed));
            if !parsed.enabled {
                println!("{}", "Result caching is disabled".yellow());
            }
            Ok(())
        }
        ConfigAction::Show { preset } => {
            let config = match preset {
                Preset::Default => CacheConfig::default(),
                Preset::LocalOnly => CacheConfig::local_only(),
                Preset::ReadOptimized => CacheConfig::read_optimized(),
                Preset::MemoryConstrained => CacheConfig::memory_constrained(),
            };
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}
