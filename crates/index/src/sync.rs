//! Catalog diffing and index synchronization
//!
//! [`diff_indexes`] is a pure set difference on `(kind, field)`. The other
//! functions talk to the engine through [`Execute`], reading the live catalog
//! on every call; nothing is cached.
//!
//! Sync is not transactional. A failure partway leaves the catalog with some
//! indexes created or dropped and the rest untouched; callers that need
//! atomicity run the sync inside their own transaction. A unique index over
//! a field with duplicate values fails with the engine's constraint error,
//! returned unmodified.

use crate::descriptor::{drop_index_sql, IndexDescriptor};
use jsondoc_core::{EncodedValue, Error, Execute, Result};
use tracing::{debug, info};

/// Parameterized catalog query for a table's indexes
pub const CATALOG_QUERY: &str = "SELECT name, sql FROM sqlite_master \
     WHERE type = 'index' AND tbl_name = ? AND sql IS NOT NULL ORDER BY name";

/// Indexes to create and drop to move a catalog to its desired state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDiff {
    /// Desired indexes missing from the catalog, in desired order
    pub to_create: Vec<IndexDescriptor>,
    /// Catalog indexes not desired, in catalog order
    pub to_drop: Vec<IndexDescriptor>,
}

impl IndexDiff {
    /// Whether the catalog already matches
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_drop.is_empty()
    }
}

/// Set difference between desired and existing descriptors on `(kind, field)`
pub fn diff_indexes(desired: &[IndexDescriptor], existing: &[IndexDescriptor]) -> IndexDiff {
    let mut to_create: Vec<IndexDescriptor> = Vec::new();
    for index in desired {
        if !existing.contains(index) && !to_create.contains(index) {
            to_create.push(index.clone());
        }
    }
    let to_drop = existing
        .iter()
        .filter(|index| !desired.contains(index))
        .cloned()
        .collect();
    IndexDiff { to_create, to_drop }
}

/// Read a table's indexes from the catalog, ordered by name
///
/// # Errors
///
/// Returns `Error::InvalidIndexSql` if any catalog entry is not a JSON-path
/// index, or the engine error if the catalog query fails.
pub fn list_indexes<E: Execute + ?Sized>(exec: &E, table: &str) -> Result<Vec<IndexDescriptor>> {
    let out = exec.execute(CATALOG_QUERY, &[EncodedValue::from(table)])?;
    out.rows
        .iter()
        .map(|row| {
            let name = text_column(row, 0, "index name")?;
            let sql = text_column(row, 1, "index sql")?;
            IndexDescriptor::from_catalog(name, sql)
        })
        .collect()
}

/// Create an index if it does not exist
///
/// # Errors
///
/// Returns the engine error, e.g. a uniqueness violation for a unique index
/// over duplicate values.
pub fn create_index<E: Execute + ?Sized>(
    exec: &E,
    table: &str,
    column: &str,
    index: &IndexDescriptor,
) -> Result<()> {
    exec.execute(&index.create_sql(table, column), &[])?;
    info!(target: "jsondoc::index", table, index = %index.name(), kind = %index.kind(), field = %index.field(), "Created index");
    Ok(())
}

/// Drop the catalog index matching `index` on `(kind, field)`
///
/// The catalog name is used, so an index created under another name is still
/// found. Returns whether an index was dropped.
///
/// # Errors
///
/// Returns the engine error if reading the catalog or dropping fails.
pub fn drop_index<E: Execute + ?Sized>(
    exec: &E,
    table: &str,
    index: &IndexDescriptor,
) -> Result<bool> {
    let existing = list_indexes(exec, table)?;
    match existing.iter().find(|candidate| *candidate == index) {
        Some(found) => {
            drop_index_by_name(exec, found.name())?;
            Ok(true)
        }
        None => {
            debug!(target: "jsondoc::index", table, index = %index, "No matching index to drop");
            Ok(false)
        }
    }
}

/// Drop an index by name; a missing index is not an error
///
/// # Errors
///
/// Returns the engine error if the statement fails.
pub fn drop_index_by_name<E: Execute + ?Sized>(exec: &E, name: &str) -> Result<()> {
    exec.execute(&drop_index_sql(name), &[])?;
    info!(target: "jsondoc::index", index = name, "Dropped index");
    Ok(())
}

/// Drop every index on a table, returning how many were dropped
///
/// # Errors
///
/// Returns the engine error if reading the catalog or dropping fails.
pub fn drop_all_indexes<E: Execute + ?Sized>(exec: &E, table: &str) -> Result<usize> {
    let existing = list_indexes(exec, table)?;
    for index in &existing {
        drop_index_by_name(exec, index.name())?;
    }
    Ok(existing.len())
}

/// Bring a table's indexes in line with `desired`, returning the applied diff
///
/// Creates run before drops, each in diff order.
///
/// # Errors
///
/// Returns the first engine error; earlier changes stay applied.
pub fn sync_indexes<E: Execute + ?Sized>(
    exec: &E,
    table: &str,
    column: &str,
    desired: &[IndexDescriptor],
) -> Result<IndexDiff> {
    let existing = list_indexes(exec, table)?;
    let diff = diff_indexes(desired, &existing);
    if diff.is_empty() {
        debug!(target: "jsondoc::index", table, "Indexes already in sync");
        return Ok(diff);
    }
    for index in &diff.to_create {
        create_index(exec, table, column, index)?;
    }
    for index in &diff.to_drop {
        drop_index_by_name(exec, index.name())?;
    }
    info!(
        target: "jsondoc::index",
        table,
        created = diff.to_create.len(),
        dropped = diff.to_drop.len(),
        "Synchronized indexes"
    );
    Ok(diff)
}

fn text_column<'r>(row: &'r [EncodedValue], idx: usize, what: &'static str) -> Result<&'r str> {
    match row.get(idx) {
        Some(EncodedValue::String(s)) => Ok(s),
        Some(other) => Err(Error::decode(what, other)),
        None => Err(Error::decode(what, &EncodedValue::Null)),
    }
}
