//! Document collections
//!
//! A collection is one table `(id INTEGER PRIMARY KEY, <column> JSON)` whose
//! documents are addressed by the `id` field inside the JSON, kept unique by
//! the built-in `<name>_idx_unique_id` index. Every operation assembles a single
//! statement from compiled fragments and hands it to the executor.

use jsondoc_core::sql::{is_plain_identifier, json_extract, quote_identifier};
use jsondoc_core::{encode_value, EncodedValue, Error, Execute, FieldPath, Result, Value};
use jsondoc_index::{IndexDescriptor, IndexDiff};
use jsondoc_query::{eq, Compiler, Predicate, SqlFragment, Update};
use serde_json::Map;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A stored document: a JSON object
pub type Document = Map<String, EncodedValue>;

/// Field every document is identified by
pub const ID_FIELD: &str = "id";

/// What to do when an insert collides with a unique index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnConflict {
    /// Return the engine's constraint error
    #[default]
    Raise,
    /// Replace the conflicting document
    Replace,
    /// Keep the existing document and return it
    Ignore,
}

impl OnConflict {
    fn insert_verb(self) -> &'static str {
        match self {
            OnConflict::Raise => "INSERT",
            OnConflict::Replace => "INSERT OR REPLACE",
            OnConflict::Ignore => "INSERT OR IGNORE",
        }
    }
}

/// Sort direction for [`FindOptions::order_by`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl OrderDirection {
    fn as_sql(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Ordering and paging for [`Collection::find`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Field to sort by; insertion order when `None`
    pub order_by: Option<FieldPath>,
    /// Sort direction
    pub direction: OrderDirection,
    /// Documents to skip
    pub offset: Option<usize>,
    /// Maximum documents to return
    pub limit: Option<usize>,
}

impl FindOptions {
    /// No ordering, no paging
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort ascending by `field`
    pub fn order_by(mut self, field: impl Into<FieldPath>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Sort descending
    pub fn descending(mut self) -> Self {
        self.direction = OrderDirection::Desc;
        self
    }

    /// Set the sort direction
    pub fn direction(mut self, direction: OrderDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Skip `offset` documents
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Return at most `limit` documents
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Handle to one collection table
#[derive(Clone)]
pub struct Collection {
    name: String,
    table: String,
    exec: Arc<dyn Execute>,
    compiler: Compiler,
}

impl Collection {
    /// Open a collection, creating its table and id index if missing
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCollectionName` unless `name` matches
    /// `[A-Za-z_][A-Za-z0-9_]*`, or the engine error if creation fails.
    pub fn open(exec: Arc<dyn Execute>, name: &str, compiler: Compiler) -> Result<Self> {
        if !is_plain_identifier(name) {
            return Err(Error::InvalidCollectionName(name.to_string()));
        }
        let collection = Collection {
            name: name.to_string(),
            table: quote_identifier(name),
            exec,
            compiler,
        };
        collection.exec.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY, {} JSON)",
                collection.table,
                collection.column()
            ),
            &[],
        )?;
        collection.create_index(&Self::id_index())?;
        info!(target: "jsondoc::collection", collection = %collection.name, "Opened collection");
        Ok(collection)
    }

    /// The built-in unique index on `id`
    pub fn id_index() -> IndexDescriptor {
        IndexDescriptor::unique(ID_FIELD)
    }

    /// Collection (table) name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn column(&self) -> &str {
        self.compiler.column()
    }

    /// Catalog name for `index` in this collection
    ///
    /// SQLite index names are database-wide, so the collection name is
    /// prefixed: `users_idx_path_age`.
    pub fn index_name(&self, index: &IndexDescriptor) -> String {
        format!("{}_{}", self.name, index.name())
    }

    fn scoped(&self, index: &IndexDescriptor) -> IndexDescriptor {
        index.clone().with_name(self.index_name(index))
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Insert one document, returning it as stored
    ///
    /// The value must encode to a JSON object. A random UUID (32 hex digits)
    /// is assigned to `id` when the document has none.
    ///
    /// With [`OnConflict::Ignore`] a colliding insert is a no-op and the
    /// existing document with the same `id` is returned. This takes a second
    /// statement and is not atomic. If the collision was on another unique
    /// index, no document carries that `id` and the submitted document is
    /// returned unsaved.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotADocument` for non-object values, an encoder error
    /// for unencodable values, or the engine's constraint error under
    /// [`OnConflict::Raise`].
    pub fn insert(&self, value: impl Into<Value>, on_conflict: OnConflict) -> Result<Document> {
        let doc = prepare_document(value.into())?;
        let sql = format!(
            "{} INTO {} ({}) VALUES (json(?)) RETURNING {}",
            on_conflict.insert_verb(),
            self.table,
            self.column(),
            self.column()
        );
        let out = self
            .exec
            .execute(&sql, &[EncodedValue::String(document_text(&doc)?)])?;
        match out.rows.first().and_then(|row| row.first()) {
            Some(stored) => parse_document(stored),
            None => {
                let id = doc.get(ID_FIELD).cloned().unwrap_or(EncodedValue::Null);
                warn!(
                    target: "jsondoc::collection",
                    collection = %self.name,
                    id = %id,
                    "Document already exists and on_conflict is Ignore; returning the existing document"
                );
                Ok(self.get(id)?.unwrap_or(doc))
            }
        }
    }

    /// Insert many documents in one transaction, returning how many were written
    ///
    /// Under [`OnConflict::Raise`] one collision rolls back the whole batch;
    /// under [`OnConflict::Ignore`] colliding documents are skipped and not
    /// counted.
    ///
    /// # Errors
    ///
    /// Returns the first encoding error before anything is written, or the
    /// engine error that aborted the batch.
    pub fn insert_many<V: Into<Value>>(
        &self,
        values: impl IntoIterator<Item = V>,
        on_conflict: OnConflict,
    ) -> Result<usize> {
        let batch = values
            .into_iter()
            .map(|v| -> Result<Vec<EncodedValue>> {
                let doc = prepare_document(v.into())?;
                Ok(vec![EncodedValue::String(document_text(&doc)?)])
            })
            .collect::<Result<Vec<_>>>()?;
        if batch.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "{} INTO {} ({}) VALUES (json(?))",
            on_conflict.insert_verb(),
            self.table,
            self.column()
        );
        let written = self.exec.execute_many(&sql, &batch)?;
        debug!(target: "jsondoc::collection", collection = %self.name, submitted = batch.len(), written, "Inserted batch");
        Ok(written)
    }

    // ========================================================================
    // Read
    // ========================================================================

    /// Documents matching `filter` (all documents when `None`)
    ///
    /// # Errors
    ///
    /// Returns the engine error, or `Error::Serialization` if a stored
    /// document is not valid JSON.
    pub fn find(&self, filter: Option<&Predicate>, options: &FindOptions) -> Result<Vec<Document>> {
        let (mut sql, params) = self.select(self.column(), filter);
        if let Some(field) = &options.order_by {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                json_extract(self.column(), field),
                options.direction.as_sql()
            ));
        }
        match (options.limit, options.offset) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(_)) => sql.push_str(" LIMIT -1"),
            (None, None) => {}
        }
        if let Some(offset) = options.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
        let out = self.exec.execute(&sql, &params)?;
        out.rows
            .iter()
            .map(|row| match row.first() {
                Some(stored) => parse_document(stored),
                None => Err(Error::decode("document JSON text", &EncodedValue::Null)),
            })
            .collect()
    }

    /// First document matching `filter` under `options` ordering
    ///
    /// # Errors
    ///
    /// Same as [`Collection::find`].
    pub fn find_one(&self, filter: Option<&Predicate>, options: &FindOptions) -> Result<Option<Document>> {
        let options = FindOptions {
            limit: Some(1),
            ..options.clone()
        };
        Ok(self.find(filter, &options)?.into_iter().next())
    }

    /// Document whose `id` equals `id`
    ///
    /// # Errors
    ///
    /// Returns an encoder error if `id` cannot be encoded, otherwise as
    /// [`Collection::find`].
    pub fn get(&self, id: impl Into<Value>) -> Result<Option<Document>> {
        let filter = eq(ID_FIELD, id)?;
        self.find_one(Some(&filter), &FindOptions::default())
    }

    /// Number of documents matching `filter`
    ///
    /// # Errors
    ///
    /// Returns the engine error.
    pub fn count(&self, filter: Option<&Predicate>) -> Result<usize> {
        let (sql, params) = self.select("COUNT(*)", filter);
        let out = self.exec.execute(&sql, &params)?;
        match out.scalar() {
            Some(EncodedValue::Number(n)) => n
                .as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| Error::decode("row count", &EncodedValue::Number(n.clone()))),
            Some(other) => Err(Error::decode("row count", other)),
            None => Err(Error::decode("row count", &EncodedValue::Null)),
        }
    }

    // ========================================================================
    // Update / delete
    // ========================================================================

    /// Apply `update` to every matching document, returning the count changed
    ///
    /// # Errors
    ///
    /// Returns the engine error (e.g. a unique index violated by the update).
    pub fn update(&self, filter: Option<&Predicate>, update: &Update) -> Result<usize> {
        let set = self.compiler.update(update);
        let where_ = self.compiler.filter(filter);
        let mut sql = format!("UPDATE {} SET {} = {}", self.table, self.column(), set.sql);
        let mut params = set.params;
        if let Some(where_) = where_ {
            sql.push_str(&format!(" WHERE {}", where_.sql));
            params.extend(where_.params);
        }
        Ok(self.exec.execute(&sql, &params)?.affected)
    }

    /// Apply `update` to the earliest-inserted matching document
    ///
    /// # Errors
    ///
    /// Same as [`Collection::update`].
    pub fn update_one(&self, filter: Option<&Predicate>, update: &Update) -> Result<usize> {
        let set = self.compiler.update(update);
        let target = self.first_rowid(filter);
        let sql = format!(
            "UPDATE {} SET {} = {} WHERE rowid IN ({})",
            self.table,
            self.column(),
            set.sql,
            target.sql
        );
        let mut params = set.params;
        params.extend(target.params);
        Ok(self.exec.execute(&sql, &params)?.affected)
    }

    /// Delete every matching document, returning the count removed
    ///
    /// # Errors
    ///
    /// Returns the engine error.
    pub fn delete(&self, filter: Option<&Predicate>) -> Result<usize> {
        let mut sql = format!("DELETE FROM {}", self.table);
        let mut params = Vec::new();
        if let Some(where_) = self.compiler.filter(filter) {
            sql.push_str(&format!(" WHERE {}", where_.sql));
            params = where_.params;
        }
        Ok(self.exec.execute(&sql, &params)?.affected)
    }

    /// Delete the earliest-inserted matching document
    ///
    /// # Errors
    ///
    /// Returns the engine error.
    pub fn delete_one(&self, filter: Option<&Predicate>) -> Result<usize> {
        let target = self.first_rowid(filter);
        let sql = format!("DELETE FROM {} WHERE rowid IN ({})", self.table, target.sql);
        Ok(self.exec.execute(&sql, &target.params)?.affected)
    }

    // ========================================================================
    // Indexes
    // ========================================================================

    /// Indexes on this collection, ordered by name
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIndexSql` for indexes not created through this
    /// layer, or the engine error.
    pub fn indexes(&self) -> Result<Vec<IndexDescriptor>> {
        jsondoc_index::list_indexes(self.exec.as_ref(), &self.name)
    }

    /// Create an index if it does not exist, named by [`Collection::index_name`]
    ///
    /// # Errors
    ///
    /// Returns the engine error, e.g. a uniqueness violation.
    pub fn create_index(&self, index: &IndexDescriptor) -> Result<()> {
        jsondoc_index::create_index(
            self.exec.as_ref(),
            &self.name,
            self.column(),
            &self.scoped(index),
        )
    }

    /// Drop the index matching `index` on `(kind, field)`; returns whether one was dropped
    ///
    /// # Errors
    ///
    /// Returns the engine error.
    pub fn drop_index(&self, index: &IndexDescriptor) -> Result<bool> {
        jsondoc_index::drop_index(self.exec.as_ref(), &self.name, index)
    }

    /// Drop an index by name
    ///
    /// # Errors
    ///
    /// Returns the engine error.
    pub fn drop_index_by_name(&self, name: &str) -> Result<()> {
        jsondoc_index::drop_index_by_name(self.exec.as_ref(), name)
    }

    /// Drop every index except the built-in `id` index, returning how many were dropped
    ///
    /// # Errors
    ///
    /// Returns the engine error.
    pub fn drop_all_indexes(&self) -> Result<usize> {
        let id_index = Self::id_index();
        let mut dropped = 0;
        for index in self.indexes()? {
            if index != id_index {
                self.drop_index_by_name(index.name())?;
                dropped += 1;
            }
        }
        Ok(dropped)
    }

    /// Make the collection's indexes match `desired`, returning the applied diff
    ///
    /// The built-in `id` index is always kept. Not transactional: see
    /// [`jsondoc_index::sync_indexes`].
    ///
    /// # Errors
    ///
    /// Returns the first engine error; earlier changes stay applied.
    pub fn sync_indexes(&self, desired: &[IndexDescriptor]) -> Result<IndexDiff> {
        let id_index = Self::id_index();
        let mut scoped: Vec<IndexDescriptor> = desired.iter().map(|i| self.scoped(i)).collect();
        if !scoped.contains(&id_index) {
            scoped.insert(0, self.scoped(&id_index));
        }
        jsondoc_index::sync_indexes(self.exec.as_ref(), &self.name, self.column(), &scoped)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn select(&self, projection: &str, filter: Option<&Predicate>) -> (String, Vec<EncodedValue>) {
        let mut sql = format!("SELECT {} FROM {}", projection, self.table);
        match self.compiler.filter(filter) {
            Some(where_) => {
                sql.push_str(&format!(" WHERE {}", where_.sql));
                (sql, where_.params)
            }
            None => (sql, Vec::new()),
        }
    }

    fn first_rowid(&self, filter: Option<&Predicate>) -> SqlFragment {
        let (mut sql, params) = self.select("rowid", filter);
        sql.push_str(" ORDER BY rowid LIMIT 1");
        SqlFragment::new(sql, params)
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("column", &self.column())
            .finish_non_exhaustive()
    }
}

/// Encode a value as a document, assigning an id when missing
fn prepare_document(value: Value) -> Result<Document> {
    match encode_value(value)? {
        EncodedValue::Object(mut doc) => {
            if !doc.contains_key(ID_FIELD) {
                doc.insert(
                    ID_FIELD.to_string(),
                    EncodedValue::String(Uuid::new_v4().simple().to_string()),
                );
            }
            Ok(doc)
        }
        other => Err(Error::NotADocument(json_kind(&other).to_string())),
    }
}

fn document_text(doc: &Document) -> Result<String> {
    Ok(serde_json::to_string(doc)?)
}

fn parse_document(stored: &EncodedValue) -> Result<Document> {
    match stored {
        EncodedValue::String(text) => Ok(serde_json::from_str(text)?),
        other => Err(Error::decode("document JSON text", other)),
    }
}

fn json_kind(value: &EncodedValue) -> &'static str {
    match value {
        EncodedValue::Null => "null",
        EncodedValue::Bool(_) => "boolean",
        EncodedValue::Number(_) => "number",
        EncodedValue::String(_) => "string",
        EncodedValue::Array(_) => "array",
        EncodedValue::Object(_) => "object",
    }
}
