//! Schema introspection per dialect.
//!
//! Each routine queries the system catalog once and registers every visible
//! table in a [`MetadataStore`]: ordinary columns through `register_column`,
//! the key through `register_primary_key` (or the dialect's synthetic row
//! identifier), and both timestamp slots cleared.

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::metadata::{MetadataStore, TimestampKind};
use crate::types::{Dialect, Params, Row, Value};

/// Populates a store from a live connection.
pub(crate) type Introspector<C> = fn(&mut C, &mut MetadataStore) -> Result<()>;

/// Resolves the introspection routine for a dialect.
pub(crate) fn introspector<C: Connection>(dialect: Dialect) -> Introspector<C> {
    match dialect {
        Dialect::Mysql => introspect_mysql::<C>,
        Dialect::Postgres => introspect_postgres::<C>,
        Dialect::Sqlite => introspect_sqlite::<C>,
    }
}

const MYSQL_COLUMNS_QUERY: &str = r#"
SELECT
    TABLE_NAME AS table_name,
    COLUMN_NAME AS column_name,
    COLUMN_KEY AS column_key
FROM INFORMATION_SCHEMA.COLUMNS
WHERE TABLE_SCHEMA = DATABASE()
ORDER BY TABLE_NAME, ORDINAL_POSITION
"#;

const POSTGRES_COLUMNS_QUERY: &str = r#"
SELECT
    c.table_name,
    c.column_name,
    CASE WHEN pk.column_name IS NOT NULL THEN 1 ELSE 0 END AS is_primary_key
FROM information_schema.columns c
LEFT JOIN (
    SELECT kcu.table_schema, kcu.table_name, kcu.column_name
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
        ON tc.constraint_name = kcu.constraint_name
        AND tc.table_schema = kcu.table_schema
    WHERE tc.constraint_type = 'PRIMARY KEY'
) pk ON c.table_schema = pk.table_schema
    AND c.table_name = pk.table_name
    AND c.column_name = pk.column_name
WHERE c.table_schema = current_schema()
ORDER BY c.table_name, c.ordinal_position
"#;

const SQLITE_TABLES_QUERY: &str = r#"
SELECT name FROM sqlite_master
WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
ORDER BY name
"#;

fn introspect_mysql<C: Connection>(conn: &mut C, store: &mut MetadataStore) -> Result<()> {
    let rows = fetch(conn, MYSQL_COLUMNS_QUERY)?;
    register_catalog_rows(store, &rows, |row| {
        Ok(text(row, "column_key")?.eq_ignore_ascii_case("PRI"))
    })
}

fn introspect_postgres<C: Connection>(conn: &mut C, store: &mut MetadataStore) -> Result<()> {
    let rows = fetch(conn, POSTGRES_COLUMNS_QUERY)?;
    register_catalog_rows(store, &rows, |row| Ok(flag(row, "is_primary_key")))
}

fn introspect_sqlite<C: Connection>(conn: &mut C, store: &mut MetadataStore) -> Result<()> {
    let tables = fetch(conn, SQLITE_TABLES_QUERY)?;

    for table_row in &tables {
        let table = text(table_row, "name")?;
        let columns_query = format!("PRAGMA table_info('{}')", table.replace('\'', "''"));
        let columns = fetch(conn, &columns_query)?;
        if columns.is_empty() {
            continue;
        }

        let mut has_key = false;
        for column in &columns {
            let name = text(column, "name")?;
            // Only the first column of a composite key acts as the lookup key.
            if column.get("pk").and_then(Value::as_i64) == Some(1) {
                store.register_primary_key(&table, &name);
                has_key = true;
            } else {
                store.register_column(&table, &name);
            }
        }

        clear_timestamps(store, &table)?;
        if !has_key {
            if let Some(row_id) = Dialect::Sqlite.synthetic_row_id() {
                store.register_primary_key(&table, row_id);
            }
        }
    }

    Ok(())
}

/// Registers rows shaped `(table_name, column_name, <key flag>)`.
///
/// The first key column reported becomes the lookup key. Further columns of a
/// composite key stay ordinary columns, as on SQLite.
fn register_catalog_rows<F>(store: &mut MetadataStore, rows: &[Row], is_key: F) -> Result<()>
where
    F: Fn(&Row) -> Result<bool>,
{
    let mut tables: Vec<String> = Vec::new();

    for row in rows {
        let table = text(row, "table_name")?;
        let column = text(row, "column_name")?;
        let has_key = store
            .table(&table)
            .is_ok_and(|meta| meta.primary_key.is_some());
        if is_key(row)? && !has_key {
            store.register_primary_key(&table, &column);
        } else {
            store.register_column(&table, &column);
        }
        if !tables.contains(&table) {
            tables.push(table);
        }
    }

    for table in &tables {
        clear_timestamps(store, table)?;
    }
    Ok(())
}

fn clear_timestamps(store: &mut MetadataStore, table: &str) -> Result<()> {
    store.designate_timestamp(TimestampKind::OnInsert, table, None)?;
    store.designate_timestamp(TimestampKind::OnUpdate, table, None)?;
    Ok(())
}

fn fetch<C: Connection>(conn: &mut C, sql: &str) -> Result<Vec<Row>> {
    conn.query(sql, &Params::new()).map_err(Error::connection)
}

fn text(row: &Row, key: &str) -> Result<String> {
    row.get(key)
        .and_then(Value::to_text)
        .ok_or_else(|| Error::Introspection(format!("expected text column '{key}'")))
}

fn flag(row: &Row, key: &str) -> bool {
    match row.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Integer(i)) => *i != 0,
        _ => false,
    }
}
