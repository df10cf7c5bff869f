//! SQL text helpers shared by the compilers
//!
//! Everything user-controlled that ends up inside SQL text goes through one of
//! these helpers: identifiers are double-quoted, literals single-quoted, and
//! the quote characters doubled. Values never appear in SQL text; they are
//! bound through positional `?` placeholders.

use crate::field::FieldPath;

/// Default name of the document column
pub const DEFAULT_DOCUMENT_COLUMN: &str = "data";

/// Quote an identifier (table, index or column name)
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// The quoted JSON path literal for a field: `'$.address.city'`
pub fn json_path_literal(field: &FieldPath) -> String {
    quote_literal(&field.json_path())
}

/// `json_extract(<column>, '$.<field>')`
pub fn json_extract(column: &str, field: &FieldPath) -> String {
    format!("json_extract({}, {})", column, json_path_literal(field))
}

/// Whether `name` is a plain SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Count `?` placeholders outside quoted literals and identifiers
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    for c in sql.chars() {
        match quote {
            // A doubled quote closes and reopens, which nets out the same.
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '?' => count += 1,
            None => {}
        }
    }
    count
}
