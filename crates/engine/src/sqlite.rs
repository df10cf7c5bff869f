//! rusqlite-backed statement executor
//!
//! [`SqliteExecutor`] owns one connection behind a `parking_lot::Mutex`, so
//! statements from different threads run one at a time. Parameters bind
//! positionally: booleans as 0/1, integers as INTEGER, other numbers as REAL,
//! strings as TEXT, and arrays/objects as their compact JSON text. Result
//! columns come back as JSON scalars; BLOB columns are rejected since no
//! statement this crate issues produces them.

use crate::config::StoreConfig;
use jsondoc_core::{EncodedValue, Error, Execute, QueryOutput, Result, Row};
use parking_lot::Mutex;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::Number;
use std::path::Path;
use tracing::{debug, info};

/// Thread-safe SQLite connection implementing [`Execute`]
pub struct SqliteExecutor {
    conn: Mutex<Connection>,
}

impl SqliteExecutor {
    /// Open (or create) a database file
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid config and `Error::Engine` if
    /// SQLite cannot open the file or apply the pragmas.
    pub fn open(path: &Path, config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let conn = Connection::open(path).map_err(Error::engine)?;
        Self::configure(conn, config)
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid config and `Error::Engine` if
    /// SQLite fails to initialize.
    pub fn open_in_memory(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let conn = Connection::open_in_memory().map_err(Error::engine)?;
        Self::configure(conn, config)
    }

    fn configure(conn: Connection, config: &StoreConfig) -> Result<Self> {
        conn.busy_timeout(config.busy_timeout())
            .map_err(Error::engine)?;
        let requested = config.journal_mode()?;
        // SQLite answers with the mode actually in effect; in-memory
        // databases always report "memory".
        let applied: String = conn
            .query_row(
                &format!("PRAGMA journal_mode={}", requested.as_pragma()),
                [],
                |row| row.get(0),
            )
            .map_err(Error::engine)?;
        info!(
            target: "jsondoc::db",
            requested = %requested,
            applied = %applied,
            busy_timeout_ms = config.busy_timeout_ms,
            "Configured connection"
        );
        Ok(SqliteExecutor {
            conn: Mutex::new(conn),
        })
    }
}

impl std::fmt::Debug for SqliteExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteExecutor").finish_non_exhaustive()
    }
}

impl Execute for SqliteExecutor {
    fn execute(&self, sql: &str, params: &[EncodedValue]) -> Result<QueryOutput> {
        debug!(target: "jsondoc::sql", sql, params = params.len(), "Executing statement");
        let conn = self.conn.lock();
        run_statement(&conn, sql, params)
    }

    /// Runs every parameter set inside one transaction; any failure rolls
    /// the whole batch back.
    fn execute_many(&self, sql: &str, param_sets: &[Vec<EncodedValue>]) -> Result<usize> {
        debug!(target: "jsondoc::sql", sql, batch = param_sets.len(), "Executing batch");
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(Error::engine)?;
        let mut affected = 0;
        {
            let mut stmt = tx.prepare_cached(sql).map_err(Error::engine)?;
            for params in param_sets {
                affected += stmt
                    .execute(params_from_iter(params.iter().map(to_sql_value)))
                    .map_err(Error::engine)?;
            }
        }
        tx.commit().map_err(Error::engine)?;
        Ok(affected)
    }
}

fn run_statement(conn: &Connection, sql: &str, params: &[EncodedValue]) -> Result<QueryOutput> {
    let mut stmt = conn.prepare_cached(sql).map_err(Error::engine)?;
    let columns = stmt.column_count();
    let mut out = Vec::new();
    {
        let mut rows = stmt
            .query(params_from_iter(params.iter().map(to_sql_value)))
            .map_err(Error::engine)?;
        while let Some(row) = rows.next().map_err(Error::engine)? {
            let mut values: Row = Vec::with_capacity(columns);
            for idx in 0..columns {
                values.push(from_sql_value(row.get_ref(idx).map_err(Error::engine)?)?);
            }
            out.push(values);
        }
    }
    // sqlite3_changes only tracks INSERT/UPDATE/DELETE; anything else would
    // report the count of an earlier statement.
    let affected = if is_data_change(sql) {
        conn.changes() as usize
    } else {
        0
    };
    Ok(QueryOutput {
        rows: out,
        affected,
    })
}

fn is_data_change(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or("");
    ["INSERT", "UPDATE", "DELETE", "REPLACE"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}

/// Convert a bound parameter to its SQLite value
pub fn to_sql_value(value: &EncodedValue) -> SqlValue {
    match value {
        EncodedValue::Null => SqlValue::Null,
        EncodedValue::Bool(b) => SqlValue::Integer(i64::from(*b)),
        EncodedValue::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        EncodedValue::String(s) => SqlValue::Text(s.clone()),
        EncodedValue::Array(_) | EncodedValue::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Convert a result column to a JSON scalar
///
/// # Errors
///
/// Returns `Error::Decode` for BLOB columns and `Error::InvalidText` for
/// TEXT that is not UTF-8.
pub fn from_sql_value(value: ValueRef<'_>) -> Result<EncodedValue> {
    match value {
        ValueRef::Null => Ok(EncodedValue::Null),
        ValueRef::Integer(i) => Ok(EncodedValue::from(i)),
        ValueRef::Real(f) => Ok(Number::from_f64(f)
            .map(EncodedValue::Number)
            .unwrap_or(EncodedValue::Null)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| EncodedValue::String(s.to_string()))
            .map_err(|e| Error::InvalidText {
                type_name: "TEXT column",
                reason: e.to_string(),
            }),
        ValueRef::Blob(bytes) => Err(Error::Decode {
            expected: "INTEGER, REAL or TEXT column",
            found: format!("BLOB of {} bytes", bytes.len()),
        }),
    }
}
