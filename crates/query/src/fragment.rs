//! Compiled SQL fragments and the column-aware compiler

use jsondoc_core::sql::{count_placeholders, is_plain_identifier};
use jsondoc_core::{EncodedValue, Error, Result, DEFAULT_DOCUMENT_COLUMN};

/// A SQL fragment plus the parameters bound to its `?` placeholders, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    /// SQL text with positional `?` placeholders
    pub sql: String,
    /// Parameters, one per placeholder
    pub params: Vec<EncodedValue>,
}

impl SqlFragment {
    /// Create a fragment from SQL text and its parameters
    pub fn new(sql: impl Into<String>, params: Vec<EncodedValue>) -> Self {
        SqlFragment {
            sql: sql.into(),
            params,
        }
    }

    /// Fragment without parameters
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Number of placeholders in the SQL text
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }

    /// Whether every placeholder has exactly one parameter
    pub fn is_aligned(&self) -> bool {
        self.placeholder_count() == self.params.len()
    }

    /// Split into `(sql, params)`
    pub fn into_parts(self) -> (String, Vec<EncodedValue>) {
        (self.sql, self.params)
    }
}

/// Compiles predicates and updates against a document column
///
/// The column name is emitted verbatim, so it is restricted to plain
/// identifiers. [`Compiler::default`] targets the `data` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiler {
    column: String,
}

impl Compiler {
    /// Compiler for the given document column
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `column` is not a plain identifier.
    pub fn new(column: impl Into<String>) -> Result<Self> {
        let column = column.into();
        if !is_plain_identifier(&column) {
            return Err(Error::Config(format!(
                "document column '{}' is not a plain identifier",
                column
            )));
        }
        Ok(Compiler { column })
    }

    /// The document column this compiler targets
    pub fn column(&self) -> &str {
        &self.column
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler {
            column: DEFAULT_DOCUMENT_COLUMN.to_string(),
        }
    }
}
