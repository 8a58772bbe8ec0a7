//! SQL assembly for single-table CRUD.
//!
//! Builders take cached [`TableMetadata`] and produce a [`Statement`]; they
//! never touch a connection, so the query text can be checked in isolation.
//! Identifiers are emitted as registered during introspection. Only names
//! already present in the metadata cache ever reach the SQL text.

use crate::error::{Error, MetadataError, Result};
use crate::metadata::TableMetadata;
use crate::params::{marker, strip_marker};
use crate::types::{Dialect, Params, Value};

/// SQL text with its named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Params,
    /// Key column returned by the statement itself (`RETURNING`), when the
    /// dialect cannot report the generated id separately.
    pub returning: Option<String>,
}

impl Statement {
    fn new(sql: String, params: Params) -> Self {
        Self {
            sql,
            params,
            returning: None,
        }
    }
}

/// Builds statements for one table of a given dialect.
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder<'a> {
    table: &'a str,
    meta: &'a TableMetadata,
    dialect: Dialect,
    manage_timestamps: bool,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(table: &'a str, meta: &'a TableMetadata, dialect: Dialect) -> Self {
        Self {
            table,
            meta,
            dialect,
            manage_timestamps: false,
        }
    }

    /// Whether designated timestamp columns are written by insert/update.
    pub fn manage_timestamps(mut self, enabled: bool) -> Self {
        self.manage_timestamps = enabled;
        self
    }

    /// `SELECT * FROM <t> WHERE <pk> = :<pk>`.
    ///
    /// SQLite lists the key before `*`: a synthetic `rowid` is not part of
    /// `*` and would otherwise be missing from the row.
    pub fn select_by_id(&self, id: Value) -> Result<Statement> {
        let pk = self.primary_key()?;
        let projection = match self.dialect {
            Dialect::Sqlite => format!("{pk}, *"),
            Dialect::Mysql | Dialect::Postgres => "*".to_string(),
        };
        let sql = format!(
            "SELECT {projection} FROM {} WHERE {pk} = {}",
            self.table,
            marker(pk)
        );
        Ok(Statement::new(sql, key_param(pk, id)))
    }

    /// `INSERT INTO <t> (<cols>) VALUES (<params>, <timestamps>)`.
    ///
    /// `data` must already be normalized with [`crate::tokenize_params`].
    /// Keys that are not ordinary columns are dropped; when none remain the
    /// build fails with [`Error::NoValidParameters`].
    pub fn insert(&self, data: Params) -> Result<Statement> {
        let params = self.filter_columns(data)?;

        let mut columns: Vec<&str> = params.keys().map(|k| strip_marker(k)).collect();
        let mut values: Vec<&str> = params.keys().map(String::as_str).collect();

        if self.manage_timestamps {
            let expression = self.dialect.timestamp_expression();
            for column in [self.meta.on_insert.as_deref(), self.meta.on_update.as_deref()]
                .into_iter()
                .flatten()
            {
                columns.push(column);
                values.push(expression);
            }
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            values.join(", ")
        );

        let mut returning = None;
        if self.dialect.returns_generated_key() {
            if let Some(pk) = self.meta.primary_key.as_deref() {
                sql.push_str(" RETURNING ");
                sql.push_str(pk);
                returning = Some(pk.to_string());
            }
        }

        Ok(Statement {
            sql,
            params,
            returning,
        })
    }

    /// `UPDATE <t> SET <assignments> WHERE <pk> = :<pk>`.
    ///
    /// With timestamp management on, the on-update column is appended to the
    /// caller's assignments as `<col> = <timestamp expression>`.
    pub fn update(&self, data: Params, id: Value) -> Result<Statement> {
        let pk = self.primary_key()?;
        let mut params = self.filter_columns(data)?;

        let mut assignments: Vec<String> = params
            .keys()
            .map(|key| format!("{} = {key}", strip_marker(key)))
            .collect();

        if self.manage_timestamps {
            if let Some(column) = self.meta.on_update.as_deref() {
                assignments.push(format!(
                    "{column} = {}",
                    self.dialect.timestamp_expression()
                ));
            }
        }

        params.insert(marker(pk), id);
        let sql = format!(
            "UPDATE {} SET {} WHERE {pk} = {}",
            self.table,
            assignments.join(", "),
            marker(pk)
        );
        Ok(Statement::new(sql, params))
    }

    /// `DELETE FROM <t> WHERE <pk> = :<pk>`.
    pub fn delete_by_id(&self, id: Value) -> Result<Statement> {
        let pk = self.primary_key()?;
        let sql = format!("DELETE FROM {} WHERE {pk} = {}", self.table, marker(pk));
        Ok(Statement::new(sql, key_param(pk, id)))
    }

    fn primary_key(&self) -> Result<&'a str> {
        let meta: &'a TableMetadata = self.meta;
        meta.primary_key
            .as_deref()
            .ok_or_else(|| MetadataError::MissingPrimaryKey(self.table.to_string()).into())
    }

    fn filter_columns(&self, data: Params) -> Result<Params> {
        let params: Params = data
            .into_iter()
            .filter(|(key, _)| self.meta.has_column(strip_marker(key)))
            .collect();

        if params.is_empty() {
            return Err(Error::NoValidParameters(self.table.to_string()));
        }
        Ok(params)
    }
}

fn key_param(pk: &str, id: Value) -> Params {
    let mut params = Params::new();
    params.insert(marker(pk), id);
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::tokenize_params;

    fn users() -> TableMetadata {
        TableMetadata {
            columns: vec!["name".into(), "email".into()],
            primary_key: Some("id".into()),
            on_insert: Some("created_at".into()),
            on_update: Some("updated_at".into()),
        }
    }

    #[test]
    fn test_select_by_id_mysql() {
        let meta = users();
        let stmt = StatementBuilder::new("users", &meta, Dialect::Mysql)
            .select_by_id(Value::from(7))
            .unwrap();
        insta::assert_snapshot!(stmt.sql, @"SELECT * FROM users WHERE id = :id");
        assert_eq!(stmt.params.get(":id"), Some(&Value::from(7)));
    }

    #[test]
    fn test_select_by_id_sqlite_lists_key_first() {
        let meta = users();
        let stmt = StatementBuilder::new("users", &meta, Dialect::Sqlite)
            .select_by_id(Value::from(7))
            .unwrap();
        insta::assert_snapshot!(stmt.sql, @"SELECT id, * FROM users WHERE id = :id");
    }

    #[test]
    fn test_insert_drops_unknown_keys() {
        let meta = users();
        let stmt = StatementBuilder::new("users", &meta, Dialect::Mysql)
            .insert(tokenize_params([("name", "Ann"), ("bogus", "x")]))
            .unwrap();
        insta::assert_snapshot!(stmt.sql, @"INSERT INTO users (name) VALUES (:name)");
        assert_eq!(stmt.params.len(), 1);
        assert_eq!(stmt.returning, None);
    }

    #[test]
    fn test_insert_timestamps_are_expressions() {
        let meta = users();
        let stmt = StatementBuilder::new("users", &meta, Dialect::Sqlite)
            .manage_timestamps(true)
            .insert(tokenize_params([(":email", "a@b.c")]))
            .unwrap();
        insta::assert_snapshot!(
            stmt.sql,
            @"INSERT INTO users (email, created_at, updated_at) VALUES (:email, datetime('now'), datetime('now'))"
        );
        assert_eq!(stmt.params.keys().collect::<Vec<_>>(), [":email"]);
    }

    #[test]
    fn test_insert_postgres_returns_key() {
        let meta = users();
        let stmt = StatementBuilder::new("users", &meta, Dialect::Postgres)
            .insert(tokenize_params([("name", "Ann")]))
            .unwrap();
        insta::assert_snapshot!(stmt.sql, @"INSERT INTO users (name) VALUES (:name) RETURNING id");
        assert_eq!(stmt.returning.as_deref(), Some("id"));
    }

    #[test]
    fn test_insert_without_valid_keys() {
        let meta = users();
        let err = StatementBuilder::new("users", &meta, Dialect::Mysql)
            .insert(tokenize_params([("bogus", "x"), ("id", "1")]))
            .unwrap_err();
        assert!(matches!(err, Error::NoValidParameters(table) if table == "users"));
    }

    #[test]
    fn test_update_appends_on_update_assignment() {
        let meta = users();
        let stmt = StatementBuilder::new("users", &meta, Dialect::Mysql)
            .manage_timestamps(true)
            .update(tokenize_params([("name", "Bo"), ("email", "b@c.d")]), Value::from(3))
            .unwrap();
        insta::assert_snapshot!(
            stmt.sql,
            @"UPDATE users SET name = :name, email = :email, updated_at = NOW() WHERE id = :id"
        );
        assert_eq!(
            stmt.params.keys().collect::<Vec<_>>(),
            [":name", ":email", ":id"]
        );
    }

    #[test]
    fn test_update_without_management_ignores_timestamps() {
        let meta = users();
        let stmt = StatementBuilder::new("users", &meta, Dialect::Mysql)
            .update(tokenize_params([("name", "Bo")]), Value::from(3))
            .unwrap();
        insta::assert_snapshot!(stmt.sql, @"UPDATE users SET name = :name WHERE id = :id");
    }

    #[test]
    fn test_delete_by_id() {
        let meta = users();
        let stmt = StatementBuilder::new("users", &meta, Dialect::Sqlite)
            .delete_by_id(Value::from(3))
            .unwrap();
        insta::assert_snapshot!(stmt.sql, @"DELETE FROM users WHERE id = :id");
    }

    #[test]
    fn test_missing_primary_key() {
        let meta = TableMetadata {
            columns: vec!["message".into()],
            ..Default::default()
        };
        let err = StatementBuilder::new("logs", &meta, Dialect::Mysql)
            .delete_by_id(Value::from(1))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Metadata(MetadataError::MissingPrimaryKey(table)) if table == "logs"
        ));
    }
}
