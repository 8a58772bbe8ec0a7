//! Configuration applied to a [`crate::DataAccess`] after introspection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Options controlling generic CRUD behavior.
///
/// Typically loaded from a config file:
///
/// ```toml
/// manageTimestamps = true
///
/// [[timestamps]]
/// table = "*"
/// onInsert = "created_at"
/// onUpdate = "updated_at"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessOptions {
    /// Fill designated timestamp columns with the dialect's current-time
    /// expression on insert/update (default false)
    #[serde(default)]
    pub manage_timestamps: bool,

    /// Timestamp designations, applied in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timestamps: Vec<TimestampRule>,
}

/// Designates the timestamp columns of one table, or of every table that
/// has the column when `table` is `*`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimestampRule {
    /// Table name, or `*` for all tables containing the column
    pub table: String,

    /// Column receiving the current time on insert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_insert: Option<String>,

    /// Column receiving the current time on insert and update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
}

impl TimestampRule {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            on_insert: None,
            on_update: None,
        }
    }

    pub fn on_insert(mut self, column: impl Into<String>) -> Self {
        self.on_insert = Some(column.into());
        self
    }

    pub fn on_update(mut self, column: impl Into<String>) -> Self {
        self.on_update = Some(column.into());
        self
    }
}
