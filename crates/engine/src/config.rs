//! Store configuration via `jsondoc.toml`
//!
//! A [`StoreConfig`] controls how the SQLite connection is opened and which
//! column holds documents. It can be built in code with the `with_*` methods
//! or loaded from a TOML file; [`StoreConfig::write_default_if_missing`]
//! drops a commented default next to the database.

use jsondoc_core::sql::is_plain_identifier;
use jsondoc_core::{Error, Result, DEFAULT_DOCUMENT_COLUMN};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Config file name conventionally placed beside the database file.
pub const CONFIG_FILE_NAME: &str = "jsondoc.toml";

/// SQLite journal mode applied when the connection opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JournalMode {
    /// Write-ahead log (default)
    #[default]
    Wal,
    /// Rollback journal deleted after each transaction
    Delete,
    /// Journal kept in memory
    Memory,
}

impl JournalMode {
    /// Value passed to `PRAGMA journal_mode`
    pub fn as_pragma(self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
            JournalMode::Memory => "MEMORY",
        }
    }

    /// Lowercase name as written in `jsondoc.toml`
    pub fn as_str(self) -> &'static str {
        match self {
            JournalMode::Wal => "wal",
            JournalMode::Delete => "delete",
            JournalMode::Memory => "memory",
        }
    }
}

impl fmt::Display for JournalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JournalMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wal" => Ok(JournalMode::Wal),
            "delete" => Ok(JournalMode::Delete),
            "memory" => Ok(JournalMode::Memory),
            other => Err(Error::Config(format!(
                "Invalid journal mode '{}'. Expected \"wal\", \"delete\" or \"memory\".",
                other
            ))),
        }
    }
}

/// Store configuration loaded from `jsondoc.toml`.
///
/// # Example
///
/// ```toml
/// journal_mode = "wal"
/// busy_timeout_ms = 5000
/// document_column = "data"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Journal mode: `"wal"`, `"delete"` or `"memory"`.
    #[serde(default = "default_journal_mode")]
    pub journal_mode: String,
    /// How long a statement waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Name of the JSON document column in every collection table.
    #[serde(default = "default_document_column")]
    pub document_column: String,
}

fn default_journal_mode() -> String {
    JournalMode::default().as_str().to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_document_column() -> String {
    DEFAULT_DOCUMENT_COLUMN.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            journal_mode: default_journal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
            document_column: default_document_column(),
        }
    }
}

impl StoreConfig {
    /// Set the journal mode
    pub fn with_journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode.as_str().to_string();
        self
    }

    /// Set the busy timeout
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the document column name
    pub fn with_document_column(mut self, column: impl Into<String>) -> Self {
        self.document_column = column.into();
        self
    }

    /// Parse the journal mode string.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the value is not a known mode.
    pub fn journal_mode(&self) -> Result<JournalMode> {
        self.journal_mode.parse()
    }

    /// Busy timeout as a `Duration`
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.journal_mode()?;
        if !is_plain_identifier(&self.document_column) {
            return Err(Error::Config(format!(
                "Invalid document column '{}'. Expected a plain identifier.",
                self.document_column
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# jsondoc store configuration
#
# Journal mode: "wal" (default), "delete" or "memory"
#   "wal"    = concurrent readers alongside one writer
#   "delete" = classic rollback journal
#   "memory" = journal kept in memory, not crash safe
journal_mode = "wal"

# Milliseconds a statement waits on a locked database before failing.
busy_timeout_ms = 5000

# Column holding the JSON document in every collection table.
document_column = "data"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
