//! Config file loading and command-line parameter parsing.
//!
//! The config file holds [`AccessOptions`] in TOML. Flags given on the
//! command line are layered on top: `--manage-timestamps` turns management
//! on, and `--on-insert`/`--on-update` rules run after the file's rules.

use crate::cli::Args;
use std::fs;
use std::path::{Path, PathBuf};
use tabula_core::{AccessOptions, TimestampRule, Value};
use thiserror::Error;

/// Invalid or unreadable user input. Reported with the configuration exit
/// code.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no database URL given (use --url or TABULA_DATABASE_URL)")]
    MissingUrl,

    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid parameter '{0}': expected KEY=VALUE")]
    InvalidParam(String),

    #[error("invalid column reference '{0}': expected TABLE.COLUMN")]
    InvalidColumnRef(String),

    #[error("invalid timestamp options")]
    Options(#[source] tabula_core::Error),
}

/// Builds the effective options from `--config` and the timestamp flags.
pub fn load_options(args: &Args) -> Result<AccessOptions, ConfigError> {
    let mut options = match &args.config {
        Some(path) => read_config(path)?,
        None => AccessOptions::default(),
    };

    options.manage_timestamps |= args.manage_timestamps;

    for raw in &args.on_insert {
        let (table, column) = parse_column_ref(raw)?;
        options
            .timestamps
            .push(TimestampRule::new(table).on_insert(column));
    }
    for raw in &args.on_update {
        let (table, column) = parse_column_ref(raw)?;
        options
            .timestamps
            .push(TimestampRule::new(table).on_update(column));
    }

    Ok(options)
}

pub fn read_config(path: &Path) -> Result<AccessOptions, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses `KEY=VALUE` pairs in order.
pub fn parse_params(raw: &[String]) -> Result<Vec<(String, Value)>, ConfigError> {
    raw.iter().map(String::as_str).map(parse_param).collect()
}

pub fn parse_param(raw: &str) -> Result<(String, Value), ConfigError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidParam(raw.to_string()))?;
    let key = key.trim();
    if key.trim_start_matches(tabula_core::MARKER).is_empty() {
        return Err(ConfigError::InvalidParam(raw.to_string()));
    }
    Ok((key.to_string(), parse_value(value)))
}

/// Reads a JSON scalar (`5`, `1.5`, `true`, `null`, `"x"`), falling back to
/// plain text.
pub fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) if !json.is_array() && !json.is_object() => Value::from(json),
        _ => Value::Text(raw.to_string()),
    }
}

fn parse_column_ref(raw: &str) -> Result<(&str, &str), ConfigError> {
    match raw.split_once('.') {
        Some((table, column)) if !table.is_empty() && !column.is_empty() => Ok((table, column)),
        _ => Err(ConfigError::InvalidColumnRef(raw.to_string())),
    }
}
