//! Schema metadata cache.
//!
//! [`MetadataStore`] holds, per table, the ordinary columns, the primary key
//! and the optional timestamp columns discovered during introspection. It
//! knows nothing about SQL or connections.
//!
//! # Invariants
//!
//! - A column designated as a timestamp column is removed from the table's
//!   ordinary columns. The move is one-way: clearing a designation does not
//!   restore the column.
//! - The primary key is tracked separately and never registered as an
//!   ordinary column by introspection.
//! - Table names are case-sensitive.
//!
//! # Thread Safety
//!
//! The store has no interior mutability. Shared `&MetadataStore` reads are
//! safe from any thread; designations need `&mut`, which serializes them
//! against readers.

use crate::error::MetadataError;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::HashMap;

/// Table key that makes a designation apply to every table containing the
/// column.
pub const ALL_TABLES: &str = "*";

/// Which managed timestamp slot a designation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampKind {
    OnInsert,
    OnUpdate,
}

/// Cached schema facts for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    /// Ordinary columns in discovery order
    pub columns: Vec<String>,
    /// Declared primary key (the first column of a composite key), or the
    /// dialect's synthetic row identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Column set to the current time on insert
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_insert: Option<String>,
    /// Column set to the current time on insert and update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
}

impl TableMetadata {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn timestamp(&self, kind: TimestampKind) -> Option<&str> {
        match kind {
            TimestampKind::OnInsert => self.on_insert.as_deref(),
            TimestampKind::OnUpdate => self.on_update.as_deref(),
        }
    }

    fn timestamp_slot(&mut self, kind: TimestampKind) -> &mut Option<String> {
        match kind {
            TimestampKind::OnInsert => &mut self.on_insert,
            TimestampKind::OnUpdate => &mut self.on_update,
        }
    }

    /// Moves `column` out of the ordinary set into the `kind` slot.
    fn reclassify(&mut self, kind: TimestampKind, column: &str) {
        self.columns.retain(|c| c != column);
        *self.timestamp_slot(kind) = Some(column.to_string());
    }
}

/// In-memory registry of table metadata keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    tables: HashMap<String, TableMetadata>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an ordinary column, creating the table entry if needed.
    ///
    /// Duplicates are not checked; introspection registers each column once.
    pub fn register_column(&mut self, table: &str, column: &str) {
        self.entry(table).columns.push(column.to_string());
    }

    /// Sets or replaces the table's primary key.
    pub fn register_primary_key(&mut self, table: &str, column: &str) {
        self.entry(table).primary_key = Some(column.to_string());
    }

    /// Designates (or clears) a managed timestamp column.
    ///
    /// With `table == "*"` every table holding `column` as an ordinary column
    /// is reclassified and the rest are left alone. Otherwise the table must
    /// exist; a non-empty `column` must currently be ordinary, while an empty
    /// or absent one clears the slot.
    pub fn designate_timestamp(
        &mut self,
        kind: TimestampKind,
        table: &str,
        column: Option<&str>,
    ) -> Result<(), MetadataError> {
        let column = column.filter(|c| !c.is_empty());

        if table == ALL_TABLES {
            if let Some(column) = column {
                for meta in self.tables.values_mut() {
                    if meta.has_column(column) {
                        meta.reclassify(kind, column);
                    }
                }
            }
            return Ok(());
        }

        let meta = self
            .tables
            .get_mut(table)
            .ok_or_else(|| MetadataError::UnknownTable(table.to_string()))?;

        match column {
            Some(column) => {
                if !meta.has_column(column) {
                    return Err(MetadataError::UnknownColumn {
                        table: table.to_string(),
                        column: column.to_string(),
                    });
                }
                meta.reclassify(kind, column);
            }
            None => *meta.timestamp_slot(kind) = None,
        }

        Ok(())
    }

    pub fn table(&self, table: &str) -> Result<&TableMetadata, MetadataError> {
        self.tables
            .get(table)
            .ok_or_else(|| MetadataError::UnknownTable(table.to_string()))
    }

    pub fn columns(&self, table: &str) -> Result<&[String], MetadataError> {
        Ok(&self.table(table)?.columns)
    }

    /// The table's key column, which may be a synthetic row identifier.
    pub fn primary_key(&self, table: &str) -> Result<&str, MetadataError> {
        self.table(table)?
            .primary_key
            .as_deref()
            .ok_or_else(|| MetadataError::MissingPrimaryKey(table.to_string()))
    }

    pub fn on_insert(&self, table: &str) -> Result<Option<&str>, MetadataError> {
        Ok(self.table(table)?.on_insert.as_deref())
    }

    pub fn on_update(&self, table: &str) -> Result<Option<&str>, MetadataError> {
        Ok(self.table(table)?.on_update.as_deref())
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Registered table names, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn entry(&mut self, table: &str) -> &mut TableMetadata {
        self.tables.entry(table.to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_store() -> MetadataStore {
        let mut store = MetadataStore::new();
        store.register_primary_key("users", "id");
        for column in ["name", "email", "created_at", "updated_at"] {
            store.register_column("users", column);
        }
        store
    }

    #[test]
    fn test_register_creates_table() {
        let store = users_store();
        assert!(store.contains_table("users"));
        assert_eq!(
            store.columns("users").unwrap(),
            ["name", "email", "created_at", "updated_at"]
        );
        assert_eq!(store.primary_key("users").unwrap(), "id");
        assert_eq!(store.on_insert("users").unwrap(), None);
        assert_eq!(store.on_update("users").unwrap(), None);
    }

    #[test]
    fn test_table_names_are_case_sensitive() {
        let store = users_store();
        assert!(matches!(
            store.columns("Users"),
            Err(MetadataError::UnknownTable(name)) if name == "Users"
        ));
    }

    #[test]
    fn test_primary_key_is_overwritten() {
        let mut store = users_store();
        store.register_primary_key("users", "uuid");
        assert_eq!(store.primary_key("users").unwrap(), "uuid");
    }

    #[test]
    fn test_primary_key_missing() {
        let mut store = MetadataStore::new();
        store.register_column("logs", "message");
        assert_eq!(
            store.primary_key("logs"),
            Err(MetadataError::MissingPrimaryKey("logs".into()))
        );
    }

    #[test]
    fn test_designate_moves_column_out_of_ordinary_set() {
        let mut store = users_store();
        store
            .designate_timestamp(TimestampKind::OnUpdate, "users", Some("updated_at"))
            .unwrap();

        assert_eq!(store.columns("users").unwrap(), ["name", "email", "created_at"]);
        assert_eq!(store.on_update("users").unwrap(), Some("updated_at"));
    }

    #[test]
    fn test_designate_unknown_column() {
        let mut store = users_store();
        let err = store
            .designate_timestamp(TimestampKind::OnUpdate, "users", Some("missing_col"))
            .unwrap_err();
        assert_eq!(
            err,
            MetadataError::UnknownColumn {
                table: "users".into(),
                column: "missing_col".into(),
            }
        );
    }

    #[test]
    fn test_designate_unknown_table() {
        let mut store = users_store();
        let err = store
            .designate_timestamp(TimestampKind::OnInsert, "ghosts", None)
            .unwrap_err();
        assert_eq!(err, MetadataError::UnknownTable("ghosts".into()));
    }

    #[test]
    fn test_designate_same_column_twice_fails() {
        let mut store = users_store();
        store
            .designate_timestamp(TimestampKind::OnInsert, "users", Some("created_at"))
            .unwrap();
        let err = store
            .designate_timestamp(TimestampKind::OnUpdate, "users", Some("created_at"))
            .unwrap_err();
        assert!(matches!(err, MetadataError::UnknownColumn { .. }));
    }

    #[test]
    fn test_clearing_does_not_restore_column() {
        let mut store = users_store();
        store
            .designate_timestamp(TimestampKind::OnInsert, "users", Some("created_at"))
            .unwrap();
        store
            .designate_timestamp(TimestampKind::OnInsert, "users", Some(""))
            .unwrap();

        assert_eq!(store.on_insert("users").unwrap(), None);
        assert!(!store.table("users").unwrap().has_column("created_at"));
    }

    #[test]
    fn test_wildcard_only_touches_tables_with_column() {
        let mut store = users_store();
        store.register_primary_key("posts", "id");
        store.register_column("posts", "title");
        store.register_column("posts", "updated_at");
        store.register_primary_key("tags", "id");
        store.register_column("tags", "label");

        store
            .designate_timestamp(TimestampKind::OnUpdate, ALL_TABLES, Some("updated_at"))
            .unwrap();

        assert_eq!(store.on_update("users").unwrap(), Some("updated_at"));
        assert_eq!(store.on_update("posts").unwrap(), Some("updated_at"));
        assert_eq!(store.on_update("tags").unwrap(), None);
        assert_eq!(store.columns("posts").unwrap(), ["title"]);
        assert_eq!(store.columns("tags").unwrap(), ["label"]);
    }

    #[test]
    fn test_wildcard_without_column_is_noop() {
        let mut store = users_store();
        store
            .designate_timestamp(TimestampKind::OnInsert, ALL_TABLES, None)
            .unwrap();
        assert_eq!(store.columns("users").unwrap().len(), 4);
    }

    #[test]
    fn test_table_names_sorted() {
        let mut store = users_store();
        store.register_primary_key("accounts", "id");
        assert_eq!(store.table_names(), ["accounts", "users"]);
        assert_eq!(store.len(), 2);
    }
}
