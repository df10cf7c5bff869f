//! jsondoc - Embedded JSON document store on SQLite
//!
//! Documents are JSON objects stored in a single column of a SQLite table.
//! Queries, updates and indexes compile to parameterized `json_extract`,
//! `json_set` and `json_remove` expressions evaluated by SQLite itself.
//!
//! # Quick Start
//!
//! ```
//! use jsondoc::{and, eq, gt, increment, Database, FindOptions, OnConflict, Update};
//! use serde_json::json;
//!
//! let db = Database::open_in_memory()?;
//! let users = db.collection("users")?;
//!
//! users.insert(json!({"name": "John", "age": 25}), OnConflict::Raise)?;
//! users.insert(json!({"name": "Jane", "age": 31}), OnConflict::Raise)?;
//!
//! let older = users.find(Some(&gt("age", 30)?), &FindOptions::new())?;
//! assert_eq!(older.len(), 1);
//!
//! let john = and([eq("name", "John")?, gt("age", 20)?])?;
//! users.update(Some(&john), &Update::from(increment("age", 1)?))?;
//! assert_eq!(users.find_one(Some(&john), &FindOptions::new())?.unwrap()["age"], 26);
//! # Ok::<(), jsondoc::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `jsondoc-core`: value model, encoder/decoder, errors, `Execute` trait
//! - `jsondoc-query`: predicate and update compilers
//! - `jsondoc-index`: index descriptors and catalog sync
//! - `jsondoc-engine`: rusqlite executor, `Database`, `Collection`

pub use jsondoc_core::*;
pub use jsondoc_engine::*;
pub use jsondoc_index::*;
pub use jsondoc_query::*;
