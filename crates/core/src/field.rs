//! Field paths into JSON documents
//!
//! A [`FieldPath`] is a dotted address such as `address.city`. Paths are not
//! validated against any schema: every string is accepted and a path that does
//! not exist in a document reads as JSON null. Dots always separate segments,
//! so a field name cannot itself contain `.`.
//!
//! # Examples
//!
//! ```
//! use jsondoc_core::{field, FieldPath};
//!
//! let city = field("address.city");
//! assert_eq!(city.as_str(), "address.city");
//! assert_eq!(city.segments().collect::<Vec<_>>(), vec!["address", "city"]);
//!
//! let same: FieldPath = jsondoc_core::field!(address.city);
//! assert_eq!(city, same);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dotted path into a JSON document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    /// Create a path from its dotted form
    pub fn new(path: impl Into<String>) -> Self {
        FieldPath(path.into())
    }

    /// The dotted form, used verbatim inside JSON-path expressions
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the dot-separated segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Extend the path by one segment
    pub fn child(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            FieldPath(segment.to_string())
        } else {
            FieldPath(format!("{}.{}", self.0, segment))
        }
    }

    /// The JSON path expression `$.<path>` understood by the engine
    pub fn json_path(&self) -> String {
        format!("$.{}", self.0)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        FieldPath::new(s)
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        FieldPath(s)
    }
}

impl From<&String> for FieldPath {
    fn from(s: &String) -> Self {
        FieldPath(s.clone())
    }
}

impl From<&FieldPath> for FieldPath {
    fn from(p: &FieldPath) -> Self {
        p.clone()
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build a field reference for use in predicates and updates
pub fn field(path: impl Into<String>) -> FieldPath {
    FieldPath::new(path)
}

/// Build a [`FieldPath`] from bare identifiers: `field!(address.city)`
#[macro_export]
macro_rules! field {
    ($head:ident $(. $tail:ident)*) => {
        $crate::FieldPath::new(concat!(stringify!($head) $(, ".", stringify!($tail))*))
    };
}
