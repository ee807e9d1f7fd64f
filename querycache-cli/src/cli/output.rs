// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Formatting for CLI output

use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use querycache::cache::CacheConfig;
use querycache::export::TableExportResult;
use querycache::query::KeyExplanation;

pub struct OutputFormatter;

impl OutputFormatter {
    /// Key fragments per query section
    pub fn format_explanation(explanation: &KeyExplanation, cache_key: &str) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("section").fg(Color::Green),
            Cell::new("fragment").fg(Color::Green),
        ]);
        for (section, fragment) in explanation.sections() {
            table.add_row(vec![section, fragment]);
        }

        let mut output = String::new();
        output.push_str(&format!("{}\n", "Cache Key".bold().green()));
        output.push_str(&format!("{}\n\n", cache_key));
        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    pub fn format_export(result: &TableExportResult) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("export id").fg(Color::Green),
            Cell::new("records").fg(Color::Green),
            Cell::new("bytes").fg(Color::Green),
            Cell::new("completed").fg(Color::Green),
        ]);
        table.add_row(vec![
            result.export_id.clone(),
            result.record_count.to_string(),
            result.byte_count.to_string(),
            result.completed_at.to_rfc3339(),
        ]);
        format!("{}\n{}\n", "Export stored".bold().green(), table)
    }

    pub fn format_config(config: &CacheConfig) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("setting").fg(Color::Green),
            Cell::new("value").fg(Color::Green),
        ]);
        let rows = [
            ("enabled", config.enabled.to_string()),
            ("local.max_entries", config.local.max_entries.to_string()),
            (
                "local.expire_after_write",
                format!("{}s", config.local.expire_after_write.as_secs()),
            ),
            (
                "remote.expiration",
                format!("{}s", config.remote.expiration.as_secs()),
            ),
            ("remote.key_prefix", config.remote.key_prefix.clone()),
            (
                "export.base_path",
                config.export.base_path.display().to_string(),
            ),
            (
                "export.expiration",
                format!("{}s", config.export.expiration.as_secs()),
            ),
            ("export.buffer_size", config.export.buffer_size.to_string()),
            ("export.batch_size", config.export.batch_size.to_string()),
        ];
        for (setting, value) in rows {
            table.add_row(vec![setting.to_string(), value]);
        }
        format!("{}\n{}\n", "Configuration is valid".bold().green(), table)
    }

    pub fn format_error(message: &str) -> String {
        format!("{} {}", "Error:".bold().red(), message)
    }
}
