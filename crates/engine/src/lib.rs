//! SQLite-backed document store for jsondoc
//!
//! - Database: opens the SQLite file (or memory) and hands out collections
//! - Collection: insert/find/update/delete and index management on one table
//! - SqliteExecutor: rusqlite implementation of `Execute`
//! - StoreConfig: journal mode, busy timeout and document column, from `jsondoc.toml`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod database;
pub mod sqlite;

pub use collection::{Collection, Document, FindOptions, OnConflict, OrderDirection, ID_FIELD};
pub use config::{JournalMode, StoreConfig, CONFIG_FILE_NAME};
pub use database::Database;
pub use sqlite::SqliteExecutor;
