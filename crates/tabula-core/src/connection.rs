//! The driver contract consumed by [`crate::DataAccess`].

use crate::types::{Params, Row};

/// A live database connection.
///
/// Implementations execute SQL containing named `:name` markers. Parameter
/// keys always arrive in canonical form (`:name`). Drivers that only accept
/// positional markers can rewrite the statement with
/// [`crate::bind_positional`].
///
/// Errors are surfaced to callers unchanged, wrapped only in
/// [`crate::Error::Connection`].
pub trait Connection {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Driver name of the backend (e.g. `sqlite`, `MySQL`).
    fn driver_name(&self) -> &str;

    /// Runs a statement and returns every row it produces.
    fn query(&mut self, sql: &str, params: &Params) -> Result<Vec<Row>, Self::Error>;

    /// Runs a statement and returns the affected-row count.
    fn execute(&mut self, sql: &str, params: &Params) -> Result<u64, Self::Error>;

    /// Identifier generated by the most recent insert, if the driver knows one.
    fn last_insert_id(&mut self) -> Result<Option<i64>, Self::Error>;
}
