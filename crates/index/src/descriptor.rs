//! Index descriptors
//!
//! A descriptor states that a field path should be indexed, optionally with a
//! uniqueness constraint. Identity is `(kind, field)`: the name is derived
//! (`idx_<kind>_<field with '.' replaced by '_'>`) and does not take part in
//! equality or hashing, so descriptors read back from the catalog compare
//! equal to freshly built ones whatever they were named.

use jsondoc_core::sql::{json_extract, quote_identifier};
use jsondoc_core::{Error, FieldPath, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Kind of index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Plain expression index on a field path
    Path,
    /// Unique expression index on a field path
    Unique,
}

impl IndexKind {
    /// Lowercase name used in derived index names
    pub fn as_str(self) -> &'static str {
        match self {
            IndexKind::Path => "path",
            IndexKind::Unique => "unique",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative index on a document field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    kind: IndexKind,
    field: FieldPath,
    name: String,
}

impl IndexDescriptor {
    /// Descriptor with a derived name
    pub fn new(kind: IndexKind, field: impl Into<FieldPath>) -> Self {
        let field = field.into();
        let name = derive_name(kind, &field);
        IndexDescriptor { kind, field, name }
    }

    /// Plain path index
    pub fn path(field: impl Into<FieldPath>) -> Self {
        Self::new(IndexKind::Path, field)
    }

    /// Unique index
    pub fn unique(field: impl Into<FieldPath>) -> Self {
        Self::new(IndexKind::Unique, field)
    }

    /// Override the derived name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Index kind
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Indexed field path
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    /// Index name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the index enforces uniqueness
    pub fn is_unique(&self) -> bool {
        self.kind == IndexKind::Unique
    }

    /// `CREATE [UNIQUE] INDEX IF NOT EXISTS` statement for `table`
    pub fn create_sql(&self, table: &str, column: &str) -> String {
        let unique = if self.is_unique() { "UNIQUE " } else { "" };
        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            unique,
            quote_identifier(&self.name),
            quote_identifier(table),
            json_extract(column, &self.field)
        )
    }

    /// `DROP INDEX IF EXISTS` statement for this descriptor's name
    pub fn drop_sql(&self) -> String {
        drop_index_sql(&self.name)
    }

    /// Rebuild a descriptor from a catalog entry
    ///
    /// The kind is `Unique` only when the statement starts with
    /// `CREATE UNIQUE INDEX`; a field or table that merely contains the word
    /// does not count. The field is the path inside the first
    /// `json_extract(<column>, '$.<path>')` call.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIndexSql` if the statement is not a
    /// `CREATE INDEX` over a `json_extract` path.
    pub fn from_catalog(name: impl Into<String>, sql: &str) -> Result<Self> {
        let kind = parse_kind(sql)?;
        let field = parse_field(sql)?;
        Ok(IndexDescriptor {
            kind,
            field: FieldPath::new(field),
            name: name.into(),
        })
    }
}

impl PartialEq for IndexDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.field == other.field
    }
}

impl Eq for IndexDescriptor {}

impl Hash for IndexDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.field.hash(state);
    }
}

impl fmt::Display for IndexDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index({}, {}, {})", self.kind, self.field, self.name)
    }
}

/// `DROP INDEX IF EXISTS "<name>"`
pub fn drop_index_sql(name: &str) -> String {
    format!("DROP INDEX IF EXISTS {}", quote_identifier(name))
}

fn derive_name(kind: IndexKind, field: &FieldPath) -> String {
    format!("idx_{}_{}", kind.as_str(), field.as_str().replace('.', "_"))
}

fn parse_kind(sql: &str) -> Result<IndexKind> {
    let words: Vec<String> = sql
        .split_whitespace()
        .take(3)
        .map(str::to_ascii_uppercase)
        .collect();
    match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["CREATE", "UNIQUE", "INDEX"] => Ok(IndexKind::Unique),
        ["CREATE", "INDEX", ..] => Ok(IndexKind::Path),
        _ => Err(Error::InvalidIndexSql(sql.to_string())),
    }
}

fn parse_field(sql: &str) -> Result<String> {
    let invalid = || Error::InvalidIndexSql(sql.to_string());
    let call = sql.find("json_extract(").ok_or_else(invalid)?;
    let rest = &sql[call..];
    let start = rest.find("'$.").ok_or_else(invalid)? + 3;

    // Read up to the closing quote, collapsing doubled quotes.
    let mut field = String::new();
    let mut chars = rest[start..].chars().peekable();
    loop {
        match chars.next() {
            Some('\'') if chars.peek() == Some(&'\'') => {
                chars.next();
                field.push('\'');
            }
            Some('\'') => break,
            Some(c) => field.push(c),
            None => return Err(invalid()),
        }
    }
    if field.is_empty() {
        return Err(invalid());
    }
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_derived_names() {
        assert_eq!(IndexDescriptor::unique("id").name(), "idx_unique_id");
        assert_eq!(IndexDescriptor::path("age").name(), "idx_path_age");
        assert_eq!(
            IndexDescriptor::path("address.city").name(),
            "idx_path_address_city"
        );
    }

    #[test]
    fn test_equality_ignores_name() {
        let a = IndexDescriptor::path("age");
        let b = IndexDescriptor::path("age").with_name("custom");
        assert_eq!(a, b);
        assert_ne!(a, IndexDescriptor::unique("age"));
        assert_ne!(a, IndexDescriptor::path("city"));

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_create_sql() {
        assert_eq!(
            IndexDescriptor::unique("id").create_sql("users", "data"),
            "CREATE UNIQUE INDEX IF NOT EXISTS \"idx_unique_id\" ON \"users\" (json_extract(data, '$.id'))"
        );
        assert_eq!(
            IndexDescriptor::path("address.city").create_sql("users", "data"),
            "CREATE INDEX IF NOT EXISTS \"idx_path_address_city\" ON \"users\" (json_extract(data, '$.address.city'))"
        );
        assert_eq!(
            IndexDescriptor::path("age").drop_sql(),
            "DROP INDEX IF EXISTS \"idx_path_age\""
        );
    }

    #[test]
    fn test_from_catalog_round_trips_create_sql() {
        for desc in [
            IndexDescriptor::unique("id"),
            IndexDescriptor::path("address.city"),
            IndexDescriptor::path("o'brien"),
        ] {
            let sql = desc.create_sql("users", "data");
            let parsed = IndexDescriptor::from_catalog(desc.name(), &sql).unwrap();
            assert_eq!(parsed, desc);
            assert_eq!(parsed.name(), desc.name());
            assert_eq!(parsed.field(), desc.field());
        }
    }

    #[test]
    fn test_from_catalog_without_if_not_exists() {
        // The catalog stores statements as written; older ones lack IF NOT EXISTS.
        let parsed = IndexDescriptor::from_catalog(
            "idx_path_age",
            "create index idx_path_age on users (json_extract(data, '$.age'))",
        )
        .unwrap();
        assert_eq!(parsed, IndexDescriptor::path("age"));
    }

    #[test]
    fn test_unique_word_in_field_is_not_a_unique_index() {
        let desc = IndexDescriptor::path("UNIQUE_code");
        let sql = desc.create_sql("UNIQUE_table", "data");
        let parsed = IndexDescriptor::from_catalog(desc.name(), &sql).unwrap();
        assert_eq!(parsed.kind(), IndexKind::Path);
        assert_eq!(parsed.field().as_str(), "UNIQUE_code");
    }

    #[test]
    fn test_from_catalog_rejects_other_sql() {
        for sql in [
            "CREATE INDEX i ON t (name)",
            "CREATE TABLE t (id INTEGER)",
            "CREATE INDEX i ON t (json_extract(data, '$.unterminated)",
            "CREATE INDEX i ON t (json_extract(data, '$.'))",
        ] {
            assert!(
                matches!(
                    IndexDescriptor::from_catalog("i", sql),
                    Err(Error::InvalidIndexSql(_))
                ),
                "accepted: {}",
                sql
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            IndexDescriptor::unique("id").to_string(),
            "Index(unique, id, idx_unique_id)"
        );
    }
}
