//! The data-access facade.
//!
//! [`DataAccess`] wraps a [`Connection`], detects its dialect, introspects
//! the schema once and then serves generic CRUD operations built from the
//! cached metadata.
//!
//! # Example
//!
//! ```ignore
//! let mut db = DataAccess::new(connection)?;
//! db.set_manage_timestamps(true)
//!     .set_on_update("*", Some("updated_at"))?;
//!
//! let id = db.insert_one("users", [("name", "Ann"), ("bogus", "x")])?;
//! let row = db.select_one_by_id("users", id)?;
//! ```

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::introspect::introspector;
use crate::metadata::{MetadataStore, TimestampKind};
use crate::params::tokenize_params;
use crate::statement::{Statement, StatementBuilder};
use crate::types::{AccessOptions, Dialect, Row, Value};
#[cfg(feature = "tracing")]
use tracing::debug;

/// Generic CRUD over an introspected schema.
pub struct DataAccess<C: Connection> {
    connection: C,
    dialect: Dialect,
    metadata: MetadataStore,
    manage_timestamps: bool,
}

impl<C: Connection> DataAccess<C> {
    /// Wraps a connection and caches its schema.
    ///
    /// # Errors
    /// [`Error::UnsupportedDialect`] when the driver is not MySQL, PostgreSQL
    /// or SQLite; connection failures from the introspection queries.
    pub fn new(mut connection: C) -> Result<Self> {
        let driver = connection.driver_name().to_string();
        let dialect = Dialect::from_driver_name(&driver)
            .ok_or_else(|| Error::UnsupportedDialect(driver.clone()))?;

        let mut metadata = MetadataStore::new();
        introspector::<C>(dialect)(&mut connection, &mut metadata)?;

        #[cfg(feature = "tracing")]
        debug!(%dialect, driver = %driver, tables = metadata.len(), "introspected schema");

        Ok(Self {
            connection,
            dialect,
            metadata,
            manage_timestamps: false,
        })
    }

    /// Wraps a connection and applies `options` on top of the introspected
    /// schema.
    pub fn with_options(connection: C, options: &AccessOptions) -> Result<Self> {
        let mut access = Self::new(connection)?;
        access.apply_options(options)?;
        Ok(access)
    }

    /// Applies timestamp management and every timestamp rule, in order.
    pub fn apply_options(&mut self, options: &AccessOptions) -> Result<&mut Self> {
        self.set_manage_timestamps(options.manage_timestamps);
        for rule in &options.timestamps {
            if let Some(column) = rule.on_insert.as_deref() {
                self.set_on_insert(&rule.table, Some(column))?;
            }
            if let Some(column) = rule.on_update.as_deref() {
                self.set_on_update(&rule.table, Some(column))?;
            }
        }
        Ok(self)
    }

    /// Enables or disables writing designated timestamp columns.
    pub fn set_manage_timestamps(&mut self, enabled: bool) -> &mut Self {
        self.manage_timestamps = enabled;
        self
    }

    /// Designates the on-insert timestamp column of `table` (`*` for every
    /// table that has `column`). `None` or an empty name clears it.
    pub fn set_on_insert(&mut self, table: &str, column: Option<&str>) -> Result<&mut Self> {
        self.metadata
            .designate_timestamp(TimestampKind::OnInsert, table, column)?;
        Ok(self)
    }

    /// Designates the on-update timestamp column, which is also filled on
    /// insert.
    pub fn set_on_update(&mut self, table: &str, column: Option<&str>) -> Result<&mut Self> {
        self.metadata
            .designate_timestamp(TimestampKind::OnUpdate, table, column)?;
        Ok(self)
    }

    /// Runs caller-supplied SQL and returns every row.
    pub fn select<I, K, V>(&mut self, query: &str, params: I) -> Result<Vec<Row>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let params = tokenize_params(params);
        self.connection
            .query(query, &params)
            .map_err(Error::connection)
    }

    /// Runs caller-supplied SQL and returns the first row, if any.
    pub fn select_one<I, K, V>(&mut self, query: &str, params: I) -> Result<Option<Row>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Ok(self.select(query, params)?.into_iter().next())
    }

    /// Fetches one row by primary key.
    pub fn select_one_by_id(&mut self, table: &str, id: impl Into<Value>) -> Result<Option<Row>> {
        let statement = self.builder(table)?.select_by_id(id.into())?;
        self.log_statement(&statement);
        Ok(self
            .connection
            .query(&statement.sql, &statement.params)
            .map_err(Error::connection)?
            .into_iter()
            .next())
    }

    /// Inserts one row built from the keys of `data` that are ordinary
    /// columns of `table`, and returns the generated identifier
    /// ([`Value::Null`] when the driver reports none).
    pub fn insert_one<I, K, V>(&mut self, table: &str, data: I) -> Result<Value>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let statement = self.builder(table)?.insert(tokenize_params(data))?;
        self.log_statement(&statement);

        if let Some(key) = statement.returning.as_deref() {
            let rows = self
                .connection
                .query(&statement.sql, &statement.params)
                .map_err(Error::connection)?;
            return Ok(rows
                .into_iter()
                .next()
                .and_then(|mut row| row.shift_remove(key))
                .unwrap_or_default());
        }

        self.connection
            .execute(&statement.sql, &statement.params)
            .map_err(Error::connection)?;
        let id = self
            .connection
            .last_insert_id()
            .map_err(Error::connection)?;
        Ok(id.map_or(Value::Null, Value::Integer))
    }

    /// Updates one row by primary key and returns the affected-row count.
    pub fn update_one<I, K, V>(&mut self, table: &str, data: I, id: impl Into<Value>) -> Result<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let statement = self
            .builder(table)?
            .update(tokenize_params(data), id.into())?;
        self.run(&statement)
    }

    /// Runs caller-supplied UPDATE SQL and returns the affected-row count.
    pub fn update<I, K, V>(&mut self, query: &str, params: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.execute_raw(query, params)
    }

    /// Runs caller-supplied DELETE SQL and returns the affected-row count.
    pub fn delete<I, K, V>(&mut self, query: &str, params: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.execute_raw(query, params)
    }

    /// Deletes one row by primary key and returns the affected-row count.
    pub fn delete_one_by_id(&mut self, table: &str, id: impl Into<Value>) -> Result<u64> {
        let statement = self.builder(table)?.delete_by_id(id.into())?;
        self.run(&statement)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The dialect's current-time expression used for managed columns.
    pub fn timestamp_expression(&self) -> &'static str {
        self.dialect.timestamp_expression()
    }

    pub fn manage_timestamps(&self) -> bool {
        self.manage_timestamps
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Gives the connection back, dropping the cached metadata.
    pub fn into_inner(self) -> C {
        self.connection
    }

    fn builder<'a>(&'a self, table: &'a str) -> Result<StatementBuilder<'a>> {
        let meta = self.metadata.table(table)?;
        Ok(StatementBuilder::new(table, meta, self.dialect).manage_timestamps(self.manage_timestamps))
    }

    fn run(&mut self, statement: &Statement) -> Result<u64> {
        self.log_statement(statement);
        self.connection
            .execute(&statement.sql, &statement.params)
            .map_err(Error::connection)
    }

    fn execute_raw<I, K, V>(&mut self, query: &str, params: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let params = tokenize_params(params);
        self.connection
            .execute(query, &params)
            .map_err(Error::connection)
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn log_statement(&self, statement: &Statement) {
        #[cfg(feature = "tracing")]
        debug!(sql = %statement.sql, params = statement.params.len(), "executing statement");
    }
}

impl<C: Connection + std::fmt::Debug> std::fmt::Debug for DataAccess<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAccess")
            .field("connection", &self.connection)
            .field("dialect", &self.dialect)
            .field("tables", &self.metadata.len())
            .field("manage_timestamps", &self.manage_timestamps)
            .finish()
    }
}
