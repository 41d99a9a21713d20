//! Output formatting utilities for the CLI.
//!
//! Every command result implements [`CommandOutput`] and is printed either as
//! pretty JSON or as a human view built from comfy-table tables.

use chrono::{DateTime, Utc};
use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::{style, StyledObject};
use serde::Serialize;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Borderless list table with upper-cased headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render a table under a count line, or a "No ... found." line.
pub fn render_list(entity_name: &str, table: &Table, total: usize) -> String {
    if total == 0 {
        return format!("No {entity_name}s found.");
    }
    let noun = if total == 1 {
        entity_name.to_string()
    } else {
        format!("{entity_name}s")
    };
    format!("{} {noun}:\n{table}", style(total).bold())
}

/// Key/value lines with aligned, dimmed keys.
pub fn detail_lines(title: &str, fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut lines = vec![style(title).bold().to_string()];
    for (key, value) in fields {
        lines.push(format!("  {}  {value}", style(format!("{key:<width$}")).dim()));
    }
    lines.join("\n")
}

/// Colour a health or activity status.
pub fn colorize_status(status: &str) -> StyledObject<&str> {
    match status {
        "healthy" | "active" | "enabled" | "applied" => style(status).green(),
        "degraded" => style(status).yellow(),
        "unhealthy" | "unreachable" | "deleted" => style(status).red(),
        "inactive" | "disabled" | "unknown" | "pending" => style(status).dim(),
        _ => style(status),
    }
}

pub fn action_success(message: &str) -> String {
    format!("{} {message}", style("\u{2713}").green().bold())
}

pub fn action_warning(message: &str) -> String {
    format!("{} {message}", style("!").yellow().bold())
}

/// Truncate to `max_len` characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// First 8 characters of an id, for list display.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn timestamp_opt(dt: Option<&DateTime<Utc>>) -> String {
    dt.map_or_else(|| "-".to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

pub fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}
