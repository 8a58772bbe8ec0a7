//! Tabula CLI - metadata-driven CRUD

use tabula_cli::cli::{self, Command, OutputFormat};
use tabula_cli::config::{self, ConfigError};
use tabula_cli::connection::{SqlxConnection, SqlxConnectionError};
use tabula_cli::logging;
use tabula_cli::output::{self, format_json};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use std::io::{self, Write};
use std::process::ExitCode;
use tabula_core::{AccessOptions, DataAccess};
use tracing::info;

use cli::Args;

/// The operation failed (database or metadata error).
const EXIT_FAILURE: u8 = 1;
/// Configuration error (bad arguments, unreadable config, unsupported dialect).
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_logging(args.verbose, args.quiet);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tabula: error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    let is_config_error = err.chain().any(|cause| {
        cause.is::<ConfigError>()
            || matches!(
                cause.downcast_ref::<SqlxConnectionError>(),
                Some(SqlxConnectionError::UnsupportedBackend(_))
            )
            || matches!(
                cause.downcast_ref::<tabula_core::Error>(),
                Some(tabula_core::Error::UnsupportedDialect(_))
            )
    });
    if is_config_error {
        EXIT_CONFIG_ERROR
    } else {
        EXIT_FAILURE
    }
}

fn run(args: Args) -> Result<()> {
    let format = args.format;
    let compact = args.compact;

    if !args.command.needs_connection() {
        let schema = schemars::schema_for!(AccessOptions);
        return emit(OutputFormat::Json, compact, &schema, String::new);
    }

    let options = config::load_options(&args)?;
    let url = args.url.as_deref().ok_or(ConfigError::MissingUrl)?;

    let connection = SqlxConnection::connect(url).context("failed to connect to database")?;
    let mut db = DataAccess::new(connection).context("failed to introspect schema")?;
    db.apply_options(&options).map_err(ConfigError::Options)?;

    info!(
        dialect = %db.dialect(),
        tables = db.metadata().len(),
        manage_timestamps = db.manage_timestamps(),
        "ready"
    );

    match args.command {
        Command::Describe { table } => {
            let tables = output::describe(db.metadata(), table.as_deref())?;
            emit(format, compact, &tables, || {
                output::format_tables(&tables, true)
            })
        }
        Command::Select { sql, params } => {
            let params = config::parse_params(&params.params)?;
            let rows = db.select(&sql, params).context("select failed")?;
            emit(format, compact, &rows, || output::format_rows(&rows, true))
        }
        Command::SelectOne { sql, params } => {
            let params = config::parse_params(&params.params)?;
            let row = db.select_one(&sql, params).context("select failed")?;
            emit(format, compact, &row, || output::format_row(row.as_ref(), true))
        }
        Command::Get { table, id } => {
            let row = db
                .select_one_by_id(&table, config::parse_value(&id))
                .with_context(|| format!("failed to fetch from {table}"))?;
            emit(format, compact, &row, || output::format_row(row.as_ref(), true))
        }
        Command::Insert { table, params } => {
            let data = config::parse_params(&params.params)?;
            let id = db
                .insert_one(&table, data)
                .with_context(|| format!("failed to insert into {table}"))?;
            emit(format, compact, &json!({ "id": id }), || {
                output::format_inserted(&id, true)
            })
        }
        Command::Update { table, id, params } => {
            let data = config::parse_params(&params.params)?;
            let affected = db
                .update_one(&table, data, config::parse_value(&id))
                .with_context(|| format!("failed to update {table}"))?;
            emit_affected(format, compact, affected)
        }
        Command::Delete { table, id } => {
            let affected = db
                .delete_one_by_id(&table, config::parse_value(&id))
                .with_context(|| format!("failed to delete from {table}"))?;
            emit_affected(format, compact, affected)
        }
        Command::Exec { sql, params } => {
            let params = config::parse_params(&params.params)?;
            let is_delete = sql
                .trim_start()
                .get(..6)
                .is_some_and(|verb| verb.eq_ignore_ascii_case("delete"));
            let affected = if is_delete {
                db.delete(&sql, params)
            } else {
                db.update(&sql, params)
            }
            .context("statement failed")?;
            emit_affected(format, compact, affected)
        }
        Command::ConfigSchema => Ok(()),
    }
}

fn emit_affected(format: OutputFormat, compact: bool, affected: u64) -> Result<()> {
    emit(format, compact, &json!({ "affected": affected }), || {
        output::format_affected(affected, true)
    })
}

/// Writes `value` as JSON, or the human-readable rendering from `table`.
fn emit<T, F>(format: OutputFormat, compact: bool, value: &T, table: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    let text = match format {
        OutputFormat::Json => {
            let mut text = format_json(value, compact).context("failed to serialize output")?;
            text.push('\n');
            text
        }
        OutputFormat::Table => table(),
    };
    io::stdout()
        .write_all(text.as_bytes())
        .context("failed to write output")
}
