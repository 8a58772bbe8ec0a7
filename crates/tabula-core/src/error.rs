//! Error types for metadata access and CRUD execution.
//!
//! # Error Handling Strategy
//!
//! - [`MetadataError`]: lookups and timestamp designations against the
//!   cached schema. Raised by [`crate::MetadataStore`] and propagated
//!   unchanged by the facade.
//!
//! - [`Error`]: everything the [`crate::DataAccess`] facade can return. Driver
//!   failures are boxed into [`Error::Connection`] without translation, so
//!   the original error stays reachable through `source()` and `Display`.
//!
//! No error is retried or recovered internally; every write is a single
//! statement, so a failure never leaves a partial write behind.

use thiserror::Error;

/// Result alias for facade operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of the schema metadata cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// The table was never registered during introspection.
    #[error("table '{0}' does not exist")]
    UnknownTable(String),

    /// The column is not an ordinary column of the table.
    #[error("table '{table}' does not have column '{column}'")]
    UnknownColumn { table: String, column: String },

    /// The table has neither a declared key nor a synthetic row identifier.
    #[error("table '{0}' has no primary key")]
    MissingPrimaryKey(String),
}

/// Errors returned by [`crate::DataAccess`].
#[derive(Debug, Error)]
pub enum Error {
    /// The connection's driver has no introspection routine or timestamp
    /// expression.
    #[error("unsupported database dialect '{0}'")]
    UnsupportedDialect(String),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Filtering the caller's data against known columns left nothing to bind.
    #[error("no valid parameters supplied for table '{0}'")]
    NoValidParameters(String),

    /// A `:name` marker in the SQL has no bound value.
    #[error("missing value for parameter ':{0}'")]
    MissingParameter(String),

    /// The SQL text could not be tokenized for positional binding.
    #[error("failed to tokenize SQL: {0}")]
    Tokenize(String),

    /// An introspection query returned a row without an expected field.
    #[error("malformed introspection row: {0}")]
    Introspection(String),

    /// Failure reported by the underlying connection, passed through as-is.
    #[error(transparent)]
    Connection(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub(crate) fn connection<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection(Box::new(err))
    }
}

impl From<sqlparser::tokenizer::TokenizerError> for Error {
    fn from(err: sqlparser::tokenizer::TokenizerError) -> Self {
        Self::Tokenize(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk I/O error")]
    struct DriverError;

    #[test]
    fn test_metadata_error_display() {
        let err = MetadataError::UnknownColumn {
            table: "users".into(),
            column: "missing_col".into(),
        };
        assert_eq!(
            err.to_string(),
            "table 'users' does not have column 'missing_col'"
        );
        assert_eq!(
            MetadataError::UnknownTable("ghosts".into()).to_string(),
            "table 'ghosts' does not exist"
        );
    }

    #[test]
    fn test_metadata_error_is_transparent() {
        let err: Error = MetadataError::UnknownTable("ghosts".into()).into();
        assert_eq!(err.to_string(), "table 'ghosts' does not exist");
    }

    #[test]
    fn test_connection_error_passes_through() {
        let err = Error::connection(DriverError);
        assert_eq!(err.to_string(), "disk I/O error");
        match err {
            Error::Connection(inner) => assert!(inner.downcast_ref::<DriverError>().is_some()),
            other => panic!("expected connection error, got {other:?}"),
        }
    }
}
