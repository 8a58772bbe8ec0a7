//! SQLx-backed [`Connection`] for live databases.
//!
//! Supports PostgreSQL, MySQL, and SQLite through the `Any` driver. A single
//! connection is driven from a private Tokio runtime, so the synchronous
//! [`Connection`] contract holds.

use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyConnection, Column, Connection as _, Row, ValueRef};
use tabula_core::{bind_positional, Connection, Dialect, Params, Row as TabulaRow, Value};
use thiserror::Error;
use tokio::runtime::Runtime;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SqlxConnectionError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("failed to start async runtime")]
    Runtime(#[from] std::io::Error),

    #[error("unsupported database backend '{0}'")]
    UnsupportedBackend(String),

    #[error(transparent)]
    Bind(#[from] tabula_core::Error),
}

/// One live database connection.
pub struct SqlxConnection {
    runtime: Runtime,
    conn: AnyConnection,
    backend: String,
    dialect: Dialect,
    last_insert_id: Option<i64>,
}

impl SqlxConnection {
    /// Connects to the database at `url`.
    ///
    /// # Errors
    /// Returns an error if the runtime cannot start, the connection fails, or
    /// the backend is not one of the supported dialects.
    pub fn connect(url: &str) -> Result<Self, SqlxConnectionError> {
        sqlx::any::install_default_drivers();

        let runtime = Runtime::new()?;
        let conn = runtime.block_on(AnyConnection::connect(url))?;
        let backend = conn.backend_name().to_string();
        let dialect = Dialect::from_driver_name(&backend)
            .ok_or_else(|| SqlxConnectionError::UnsupportedBackend(backend.clone()))?;

        debug!(backend = %backend, "connected");

        Ok(Self {
            runtime,
            conn,
            backend,
            dialect,
            last_insert_id: None,
        })
    }
}

impl Connection for SqlxConnection {
    type Error = SqlxConnectionError;

    fn driver_name(&self) -> &str {
        &self.backend
    }

    fn query(&mut self, sql: &str, params: &Params) -> Result<Vec<TabulaRow>, Self::Error> {
        let (sql, values) = bind_positional(sql, self.dialect, params)?;
        let query = prepare(&sql, values);
        let rows = self.runtime.block_on(query.fetch_all(&mut self.conn))?;
        rows.iter().map(decode_row).collect()
    }

    fn execute(&mut self, sql: &str, params: &Params) -> Result<u64, Self::Error> {
        let (sql, values) = bind_positional(sql, self.dialect, params)?;
        let query = prepare(&sql, values);
        let result = self.runtime.block_on(query.execute(&mut self.conn))?;
        self.last_insert_id = result.last_insert_id();
        Ok(result.rows_affected())
    }

    fn last_insert_id(&mut self) -> Result<Option<i64>, Self::Error> {
        Ok(self.last_insert_id)
    }
}

fn prepare(sql: &str, values: Vec<Value>) -> Query<'_, Any, AnyArguments<'_>> {
    values.into_iter().fold(sqlx::query(sql), bind_value)
}

fn bind_value<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    value: Value,
) -> Query<'q, Any, AnyArguments<'q>> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(v) => query.bind(v),
        Value::Integer(v) => query.bind(v),
        Value::Real(v) => query.bind(v),
        Value::Text(v) => query.bind(v),
        Value::Blob(v) => query.bind(v),
    }
}

fn decode_row(row: &AnyRow) -> Result<TabulaRow, SqlxConnectionError> {
    let mut out = TabulaRow::with_capacity(row.columns().len());
    for column in row.columns() {
        let idx = column.ordinal();
        out.insert(column.name().to_string(), decode_value(row, idx)?);
    }
    Ok(out)
}

/// Decodes a column into the closest [`Value`], handling the different
/// representations each backend reports.
fn decode_value(row: &AnyRow, idx: usize) -> Result<Value, SqlxConnectionError> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Value::Null);
    }
    if let Ok(v) = row.try_get::<bool, _>(idx) {
        return Ok(Value::Bool(v));
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Ok(Value::Integer(v));
    }
    if let Ok(v) = row.try_get::<i32, _>(idx) {
        return Ok(Value::Integer(i64::from(v)));
    }
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return Ok(Value::Real(v));
    }
    if let Ok(v) = row.try_get::<String, _>(idx) {
        return Ok(Value::Text(v));
    }
    Ok(Value::Blob(row.try_get::<Vec<u8>, _>(idx)?))
}
