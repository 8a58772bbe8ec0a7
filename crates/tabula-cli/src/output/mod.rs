//! Output formatting modules.

pub mod json;
pub mod table;

pub use json::format_json;
pub use table::{format_affected, format_inserted, format_row, format_rows, format_tables};

use serde::Serialize;
use tabula_core::{MetadataStore, TableMetadata};

/// Cached metadata of one table, as printed by `describe`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescription<'a> {
    pub name: &'a str,
    #[serde(flatten)]
    pub metadata: &'a TableMetadata,
}

/// Describes every table, sorted by name, or the single table `only`.
pub fn describe<'a>(
    store: &'a MetadataStore,
    only: Option<&'a str>,
) -> Result<Vec<TableDescription<'a>>, tabula_core::MetadataError> {
    let names = match only {
        Some(name) => vec![name],
        None => store.table_names(),
    };
    names
        .into_iter()
        .map(|name| {
            Ok(TableDescription {
                name,
                metadata: store.table(name)?,
            })
        })
        .collect()
}
