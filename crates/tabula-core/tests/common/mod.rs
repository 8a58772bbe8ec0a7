#![allow(dead_code)]

use rusqlite::types::{Value as SqlValue, ValueRef};
use tabula_core::{Connection, Params, Row, Value};

/// In-memory SQLite through rusqlite, binding `:name` markers natively.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    pub fn with_schema(ddl: &str) -> Self {
        let conn = rusqlite::Connection::open_in_memory().expect("open in-memory sqlite");
        conn.execute_batch(ddl).expect("apply schema");
        Self { conn }
    }

    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl Connection for SqliteConnection {
    type Error = rusqlite::Error;

    fn driver_name(&self) -> &str {
        "sqlite"
    }

    fn query(&mut self, sql: &str, params: &Params) -> Result<Vec<Row>, Self::Error> {
        let mut stmt = self.conn.prepare(sql)?;
        bind(&mut stmt, params)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.raw_query();
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (idx, name) in names.iter().enumerate() {
                record.insert(name.clone(), from_sql(row.get_ref(idx)?));
            }
            out.push(record);
        }
        Ok(out)
    }

    fn execute(&mut self, sql: &str, params: &Params) -> Result<u64, Self::Error> {
        let mut stmt = self.conn.prepare(sql)?;
        bind(&mut stmt, params)?;
        Ok(stmt.raw_execute()? as u64)
    }

    fn last_insert_id(&mut self) -> Result<Option<i64>, Self::Error> {
        Ok(Some(self.conn.last_insert_rowid()))
    }
}

fn bind(stmt: &mut rusqlite::Statement<'_>, params: &Params) -> rusqlite::Result<()> {
    for (name, value) in params {
        if let Some(idx) = stmt.parameter_index(name)? {
            stmt.raw_bind_parameter(idx, to_sql(value))?;
        }
    }
    Ok(())
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

#[derive(Debug, thiserror::Error)]
#[error("scripted failure: {0}")]
pub struct ScriptedError(pub String);

/// A fake driver that answers queries from canned rows and records every
/// statement it receives.
#[derive(Debug, Default)]
pub struct ScriptedConnection {
    driver: String,
    responses: Vec<(String, Vec<Row>)>,
    pub log: Vec<(String, Params)>,
    pub affected: u64,
    pub insert_id: Option<i64>,
    pub fail_on: Option<String>,
}

impl ScriptedConnection {
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            affected: 1,
            ..Default::default()
        }
    }

    /// Answers any query containing `needle` with `rows`.
    pub fn respond(mut self, needle: &str, rows: Vec<Row>) -> Self {
        self.responses.push((needle.to_string(), rows));
        self
    }

    pub fn last_sql(&self) -> &str {
        self.log.last().map(|(sql, _)| sql.as_str()).unwrap_or_default()
    }

    pub fn last_params(&self) -> &Params {
        &self.log.last().expect("no statement recorded").1
    }

    fn record(&mut self, sql: &str, params: &Params) -> Result<(), ScriptedError> {
        self.log.push((sql.to_string(), params.clone()));
        match &self.fail_on {
            Some(needle) if sql.contains(needle.as_str()) => Err(ScriptedError(sql.to_string())),
            _ => Ok(()),
        }
    }
}

impl Connection for ScriptedConnection {
    type Error = ScriptedError;

    fn driver_name(&self) -> &str {
        &self.driver
    }

    fn query(&mut self, sql: &str, params: &Params) -> Result<Vec<Row>, Self::Error> {
        self.record(sql, params)?;
        Ok(self
            .responses
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    fn execute(&mut self, sql: &str, params: &Params) -> Result<u64, Self::Error> {
        self.record(sql, params)?;
        Ok(self.affected)
    }

    fn last_insert_id(&mut self) -> Result<Option<i64>, Self::Error> {
        Ok(self.insert_id)
    }
}

/// Builds a row from `(column, value)` pairs.
pub fn row<const N: usize>(pairs: [(&str, Value); N]) -> Row {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// A MySQL `INFORMATION_SCHEMA.COLUMNS` row as returned by introspection.
pub fn mysql_column(table: &str, column: &str, key: &str) -> Row {
    row([
        ("table_name", Value::from(table)),
        ("column_name", Value::from(column)),
        ("column_key", Value::from(key)),
    ])
}
