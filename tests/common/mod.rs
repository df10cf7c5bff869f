//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

pub use jsondoc::{Collection, Database, Document, FindOptions, OnConflict};
use chrono::NaiveDate;
use serde_json::{json, Value as Json};
use tempfile::TempDir;

// ============================================================================
// TestDb
// ============================================================================

/// File-backed database in a temporary directory, removed on drop
pub struct TestDb {
    pub db: Database,
    pub dir: TempDir,
}

impl TestDb {
    /// Fresh database file
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let db = Database::open(dir.path().join("test.db")).expect("open database");
        TestDb { db, dir }
    }

    /// The standard `test_collection`
    pub fn collection(&self) -> Collection {
        self.db.collection("test_collection").expect("open collection")
    }

    /// `test_collection` seeded with [`people`]
    pub fn seeded(&self) -> Collection {
        let collection = self.collection();
        for doc in people() {
            collection.insert(doc, OnConflict::Raise).expect("insert fixture");
        }
        collection
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn day(d: u32) -> f64 {
    NaiveDate::from_ymd_opt(2021, 1, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp() as f64)
        .expect("valid date")
}

/// Five people, two of them named John, in insertion order
pub fn people() -> Vec<Json> {
    vec![
        json!({"name": "John", "age": 25, "address": {"city": "New York", "state": "NY"}, "created_at": day(1)}),
        json!({"name": "Jane", "age": 22, "address": {"city": "Los Angeles", "state": "CA"}, "created_at": day(2)}),
        json!({"name": "Joe", "age": 30, "address": {"city": "Chicago", "state": "IL"}, "created_at": day(3)}),
        json!({"name": "John", "age": 40, "address": {"city": "New York", "state": "NY"}, "created_at": day(4)}),
        json!({"name": "Linda", "age": 27, "address": {"city": "Los Angeles", "state": "CA"}, "created_at": day(5)}),
    ]
}

/// String field of each document, in order
pub fn strings(docs: &[Document], key: &str) -> Vec<String> {
    docs.iter()
        .map(|d| d[key].as_str().unwrap_or_default().to_string())
        .collect()
}

/// Integer field of each document, in order
pub fn ints(docs: &[Document], key: &str) -> Vec<i64> {
    docs.iter().map(|d| d[key].as_i64().unwrap_or(i64::MIN)).collect()
}
