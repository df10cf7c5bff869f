//! Core trait for statement execution
//!
//! This module defines the [`Execute`] trait, the single capability the
//! document layer consumes from its storage engine. Swapping the engine
//! (or substituting a recording fake in tests) requires no change to the
//! compilers or the collection layer.

use crate::error::Result;
use crate::EncodedValue;
use std::sync::Arc;

/// One result row, columns in select order
pub type Row = Vec<EncodedValue>;

/// Rows returned by a statement plus the number of rows it changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    /// Result rows (empty for statements without results)
    pub rows: Vec<Row>,
    /// Rows inserted, updated or deleted (0 for read-only statements)
    pub affected: usize,
}

impl QueryOutput {
    /// Output of a statement that changed `affected` rows and returned nothing
    pub fn changed(affected: usize) -> Self {
        QueryOutput {
            rows: Vec::new(),
            affected,
        }
    }

    /// Output carrying result rows
    pub fn with_rows(rows: Vec<Row>) -> Self {
        QueryOutput { rows, affected: 0 }
    }

    /// First column of the first row
    pub fn scalar(&self) -> Option<&EncodedValue> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// Parameterized statement execution
///
/// Placeholders are positional `?` markers; `params` binds them in order.
/// Arrays and objects bind as their JSON text, booleans as 0/1.
///
/// Thread safety: implementations must be safe to call from multiple threads
/// (requires Send + Sync). Errors raised by the engine are returned as
/// [`Error::Engine`](crate::Error::Engine) without modification.
pub trait Execute: Send + Sync {
    /// Execute one statement
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects or fails the statement.
    fn execute(&self, sql: &str, params: &[EncodedValue]) -> Result<QueryOutput>;

    /// Execute one statement once per parameter set, returning total affected rows
    ///
    /// The default runs the statements one by one. Engines should override it
    /// to run the batch atomically.
    fn execute_many(&self, sql: &str, param_sets: &[Vec<EncodedValue>]) -> Result<usize> {
        let mut affected = 0;
        for params in param_sets {
            affected += self.execute(sql, params)?.affected;
        }
        Ok(affected)
    }
}

impl<T: Execute + ?Sized> Execute for &T {
    fn execute(&self, sql: &str, params: &[EncodedValue]) -> Result<QueryOutput> {
        (**self).execute(sql, params)
    }

    fn execute_many(&self, sql: &str, param_sets: &[Vec<EncodedValue>]) -> Result<usize> {
        (**self).execute_many(sql, param_sets)
    }
}

impl<T: Execute + ?Sized> Execute for Arc<T> {
    fn execute(&self, sql: &str, params: &[EncodedValue]) -> Result<QueryOutput> {
        (**self).execute(sql, params)
    }

    fn execute_many(&self, sql: &str, param_sets: &[Vec<EncodedValue>]) -> Result<usize> {
        (**self).execute_many(sql, param_sets)
    }
}
