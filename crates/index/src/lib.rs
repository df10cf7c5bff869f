//! Index management for jsondoc
//!
//! - IndexDescriptor: declarative `(kind, field)` index with a derived name
//! - from_catalog: rebuilds descriptors from the engine's stored index SQL
//! - diff_indexes: desired vs existing set difference
//! - sync_indexes and friends: apply changes through any `Execute`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod descriptor;
pub mod sync;

pub use descriptor::{drop_index_sql, IndexDescriptor, IndexKind};
pub use sync::{
    create_index, diff_indexes, drop_all_indexes, drop_index, drop_index_by_name, list_indexes,
    sync_indexes, IndexDiff, CATALOG_QUERY,
};
