//! Shared types for the data-access API.

mod dialect;
mod options;
mod value;

pub use dialect::{Dialect, PlaceholderStyle};
pub use options::{AccessOptions, TimestampRule};
pub use value::{Params, Row, Value};
