//! Database handle
//!
//! A [`Database`] owns one SQLite connection and hands out [`Collection`]
//! handles that share it. Opening a collection creates its table on demand.

use crate::collection::Collection;
use crate::config::StoreConfig;
use crate::sqlite::SqliteExecutor;
use jsondoc_core::sql::{is_plain_identifier, quote_identifier};
use jsondoc_core::{EncodedValue, Error, Execute, Result};
use jsondoc_query::Compiler;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Embedded document database over SQLite
#[derive(Debug, Clone)]
pub struct Database {
    exec: Arc<SqliteExecutor>,
    config: StoreConfig,
    compiler: Compiler,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) a database file with the default configuration
    ///
    /// # Errors
    ///
    /// Returns the engine error if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Open (or create) a database file with `config`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid config, or the engine error if
    /// the file cannot be opened.
    pub fn open_with_config(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        let exec = SqliteExecutor::open(path, &config)?;
        info!(target: "jsondoc::db", path = %path.display(), "Opened database");
        Self::from_parts(exec, config, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns the engine error if SQLite fails to initialize.
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with_config(StoreConfig::default())
    }

    /// Open a private in-memory database with `config`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid config, or the engine error.
    pub fn open_in_memory_with_config(config: StoreConfig) -> Result<Self> {
        let exec = SqliteExecutor::open_in_memory(&config)?;
        info!(target: "jsondoc::db", "Opened in-memory database");
        Self::from_parts(exec, config, None)
    }

    fn from_parts(exec: SqliteExecutor, config: StoreConfig, path: Option<PathBuf>) -> Result<Self> {
        let compiler = Compiler::new(config.document_column.clone())?;
        Ok(Database {
            exec: Arc::new(exec),
            config,
            compiler,
            path,
        })
    }

    /// Database file path, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Active configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The underlying executor, for issuing raw statements
    pub fn executor(&self) -> &Arc<SqliteExecutor> {
        &self.exec
    }

    /// Get a collection, creating it if missing
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCollectionName` unless `name` matches
    /// `[A-Za-z_][A-Za-z0-9_]*`, or the engine error.
    pub fn collection(&self, name: &str) -> Result<Collection> {
        let exec: Arc<dyn Execute> = self.exec.clone();
        Collection::open(exec, name, self.compiler.clone())
    }

    /// Names of all collections, sorted
    ///
    /// # Errors
    ///
    /// Returns the engine error.
    pub fn collection_names(&self) -> Result<Vec<String>> {
        self.catalog_names("table")
    }

    /// Drop a collection and its indexes; a missing collection is not an error
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCollectionName` for a malformed name, or the
    /// engine error.
    pub fn drop_collection(&self, name: &str) -> Result<()> {
        if !is_plain_identifier(name) {
            return Err(Error::InvalidCollectionName(name.to_string()));
        }
        self.exec
            .execute(&format!("DROP TABLE IF EXISTS {}", quote_identifier(name)), &[])?;
        info!(target: "jsondoc::db", collection = name, "Dropped collection");
        Ok(())
    }

    /// Drop every collection, returning how many were dropped
    ///
    /// # Errors
    ///
    /// Returns the first engine error; earlier drops stay applied.
    pub fn drop_all_collections(&self) -> Result<usize> {
        let names = self.collection_names()?;
        for name in &names {
            self.exec
                .execute(&format!("DROP TABLE IF EXISTS {}", quote_identifier(name)), &[])?;
        }
        info!(target: "jsondoc::db", count = names.len(), "Dropped all collections");
        Ok(names.len())
    }

    /// Drop every explicit index in the database, including the built-in
    /// `id` indexes, returning how many were dropped
    ///
    /// Reopening a collection recreates its `id` index.
    ///
    /// # Errors
    ///
    /// Returns the first engine error; earlier drops stay applied.
    pub fn drop_all_indexes(&self) -> Result<usize> {
        let names = self.catalog_names("index")?;
        for name in &names {
            jsondoc_index::drop_index_by_name(self.exec.as_ref(), name)?;
        }
        Ok(names.len())
    }

    fn catalog_names(&self, kind: &str) -> Result<Vec<String>> {
        let out = self.exec.execute(
            "SELECT name FROM sqlite_master WHERE type = ? AND sql IS NOT NULL \
             AND name NOT LIKE 'sqlite_%' ORDER BY name",
            &[EncodedValue::from(kind)],
        )?;
        out.rows
            .iter()
            .map(|row| match row.first() {
                Some(EncodedValue::String(name)) => Ok(name.clone()),
                Some(other) => Err(Error::decode("catalog name", other)),
                None => Err(Error::decode("catalog name", &EncodedValue::Null)),
            })
            .collect()
    }
}
