//! Human-readable table output formatting.

use super::TableDescription;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::fmt::Write;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabula_core::{Row, Value};

fn colored(use_colors: bool) -> bool {
    use_colors && std::io::stdout().is_terminal()
}

/// Format rows as a grid with a trailing row count.
pub fn format_rows(rows: &[Row], use_colors: bool) -> String {
    let colored = colored(use_colors);
    let mut out = String::new();

    if let Some(first) = rows.first() {
        let mut builder = Builder::default();
        builder.push_record(first.keys().cloned().collect::<Vec<_>>());
        for row in rows {
            builder.push_record(row.values().map(cell).collect::<Vec<_>>());
        }
        let mut table = builder.build();
        table.with(Style::rounded());
        let _ = writeln!(out, "{table}");
    }

    let count = match rows.len() {
        1 => "(1 row)".to_string(),
        n => format!("({n} rows)"),
    };
    if colored {
        let _ = writeln!(out, "{}", count.dimmed());
    } else {
        let _ = writeln!(out, "{count}");
    }
    out
}

/// Format an optional single row.
pub fn format_row(row: Option<&Row>, use_colors: bool) -> String {
    match row {
        Some(row) => format_rows(std::slice::from_ref(row), use_colors),
        None if colored(use_colors) => format!("{}\n", "(no row)".dimmed()),
        None => "(no row)\n".to_string(),
    }
}

pub fn format_inserted(id: &Value, use_colors: bool) -> String {
    labeled("inserted id", &cell(id), use_colors)
}

pub fn format_affected(count: u64, use_colors: bool) -> String {
    labeled("affected rows", &count.to_string(), use_colors)
}

/// Format cached table metadata, one line per table.
pub fn format_tables(tables: &[TableDescription<'_>], use_colors: bool) -> String {
    let colored = colored(use_colors);
    let mut builder = Builder::default();
    builder.push_record(["table", "primary key", "columns", "on insert", "on update"]);
    for table in tables {
        let meta = table.metadata;
        builder.push_record([
            table.name.to_string(),
            meta.primary_key.clone().unwrap_or_default(),
            meta.columns.join(", "),
            meta.on_insert.clone().unwrap_or_default(),
            meta.on_update.clone().unwrap_or_default(),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());

    let title = format!("Tables ({})", tables.len());
    let mut out = String::new();
    if colored {
        let _ = writeln!(out, "{}", title.bold());
    } else {
        let _ = writeln!(out, "{title}");
    }
    let _ = writeln!(out, "{table}");
    out
}

fn labeled(label: &str, value: &str, use_colors: bool) -> String {
    if colored(use_colors) {
        format!("{}: {}\n", label.cyan(), value)
    } else {
        format!("{label}: {value}\n")
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}
