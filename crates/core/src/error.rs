//! Error types for jsondoc
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors raised by the backing engine (constraint violations, I/O failures)
//! are carried unmodified inside [`Error::Engine`]. This layer never retries
//! and never suppresses them.

use std::io;
use thiserror::Error;

/// Result type alias for jsondoc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by a storage engine
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for jsondoc
#[derive(Debug, Error)]
pub enum Error {
    /// The encoder has no mapping for a runtime value
    #[error("Cannot encode value of type {type_name}: {reason}")]
    Unencodable {
        /// Type of the offending value
        type_name: String,
        /// Why no mapping applied
        reason: String,
    },

    /// Bytes or a path could not be decoded as UTF-8 text
    #[error("Invalid text in {type_name}: {reason}")]
    InvalidText {
        /// Type of the offending value
        type_name: &'static str,
        /// Underlying decoding failure
        reason: String,
    },

    /// Value nesting exceeded the encoder's depth limit
    #[error("Value nesting depth {depth} exceeds maximum of {max} levels")]
    NestingTooDeep {
        /// Depth reached
        depth: usize,
        /// Maximum allowed depth
        max: usize,
    },

    /// A logical node or IN/NOT IN list was built with no elements
    #[error("Empty predicate list in {0}")]
    EmptyPredicateList(&'static str),

    /// An update statement was built with no operations
    #[error("Update requires at least one operation")]
    EmptyUpdateList,

    /// Increment delta did not encode to a number
    #[error("Increment delta must be numeric, got {0}")]
    NonNumericDelta(String),

    /// Catalog index SQL matched neither the path nor the unique pattern
    #[error("Invalid index SQL: {0}")]
    InvalidIndexSql(String),

    /// An encoded value did not have the shape a decoder expected
    #[error("Decode error: expected {expected}, found {found}")]
    Decode {
        /// What the decoder expected
        expected: &'static str,
        /// What was found instead
        found: String,
    },

    /// Collection name is not a plain SQL identifier
    #[error("Invalid collection name: {0:?}")]
    InvalidCollectionName(String),

    /// A value stored as a document did not encode to a JSON object
    #[error("Document must encode to a JSON object, got {0}")]
    NotADocument(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (config files, database files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error surfaced verbatim from the storage engine
    #[error("Engine error: {0}")]
    Engine(#[source] EngineError),
}

impl Error {
    /// Wrap an engine error without altering it
    pub fn engine<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Engine(Box::new(err))
    }

    /// Build a decode error describing the found value
    pub fn decode(expected: &'static str, found: &serde_json::Value) -> Self {
        Error::Decode {
            expected,
            found: found.to_string(),
        }
    }

    /// Check whether this error originated in the storage engine
    pub fn is_engine(&self) -> bool {
        matches!(self, Error::Engine(_))
    }
}
