pub mod access;
pub mod connection;
pub mod error;
mod introspect;
pub mod metadata;
pub mod params;
pub mod statement;
pub mod types;

// Re-export main types and functions
pub use access::DataAccess;
pub use connection::Connection;
pub use error::{Error, MetadataError, Result};
pub use metadata::{MetadataStore, TableMetadata, TimestampKind, ALL_TABLES};
pub use params::{bind_positional, find_markers, tokenize_params, NamedMarker, MARKER};
pub use statement::{Statement, StatementBuilder};
pub use types::{AccessOptions, Dialect, Params, PlaceholderStyle, Row, TimestampRule, Value};
