//! Database dialects with introspection and timestamp support.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Database engine family of the active connection.
///
/// Only dialects with both an introspection routine and a current-timestamp
/// expression are represented; anything else is rejected when the
/// connection is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Mysql,
    Postgres,
    Sqlite,
}

/// How positional bind markers are written for a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` for every parameter.
    QuestionMark,
    /// `$1`, `$2`, ... in order of appearance.
    Numbered,
}

impl Dialect {
    /// Maps a driver name as reported by a connection (case-insensitive).
    pub fn from_driver_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::Mysql),
            "postgres" | "postgresql" | "pgsql" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// SQL expression that yields the current time, spliced verbatim into
    /// statements for managed timestamp columns.
    pub fn timestamp_expression(&self) -> &'static str {
        match self {
            Self::Mysql | Self::Postgres => "NOW()",
            Self::Sqlite => "datetime('now')",
        }
    }

    /// Column name used as the key for tables that declare none.
    pub fn synthetic_row_id(&self) -> Option<&'static str> {
        match self {
            Self::Sqlite => Some("rowid"),
            Self::Mysql | Self::Postgres => None,
        }
    }

    pub fn placeholder_style(&self) -> PlaceholderStyle {
        match self {
            Self::Postgres => PlaceholderStyle::Numbered,
            Self::Mysql | Self::Sqlite => PlaceholderStyle::QuestionMark,
        }
    }

    /// Whether inserts must read the generated key back with `RETURNING`.
    pub fn returns_generated_key(&self) -> bool {
        matches!(self, Self::Postgres)
    }

    pub fn to_sqlparser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::{MySqlDialect, PostgreSqlDialect, SQLiteDialect};
        match self {
            Self::Mysql => Box::new(MySqlDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}
