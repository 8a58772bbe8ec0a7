//! Tabula CLI library.
//!
//! This module exposes internal types for testing purposes.
//! The main entry point is the `tabula` binary.

pub mod cli;
pub mod config;
pub mod connection;
pub mod logging;
pub mod output;

// Re-export commonly used types
pub use cli::Args;
pub use config::ConfigError;
pub use connection::SqlxConnection;
