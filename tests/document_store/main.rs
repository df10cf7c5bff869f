//! Document store integration tests
//!
//! End-to-end behavior of collections on a real SQLite file: queries,
//! updates, conflicts, indexes, and value round trips through storage.

#[path = "../common/mod.rs"]
mod common;

mod encoding;
mod find;
mod indexes;
mod insert;
mod update;
