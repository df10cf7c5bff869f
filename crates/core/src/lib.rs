//! Core types and traits for jsondoc
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: Rich in-memory value model (records, enums, timestamps, opaque values)
//! - EncodedValue: JSON-compatible representation stored in the document column
//! - Encoder: Converts a Value to an EncodedValue with exclusion and custom encoders
//! - Decode: Reads typed values back out of stored documents
//! - FieldPath: Dot-separated document field reference
//! - Error: Error type hierarchy
//! - Traits: Statement execution seam (Execute)
//! - SQL helpers: Quoting and JSON path literals shared by the compilers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decode;
pub mod encoder;
pub mod error;
pub mod field;
pub mod sql;
pub mod traits;
pub mod value;

/// JSON-compatible value: null, bool, number, string, array, or object
/// with string keys
pub type EncodedValue = serde_json::Value;

pub use decode::{decode, Fields, FromEncoded};
pub use encoder::{
    encode, encode_value, epoch_seconds, total_seconds, CustomEncoder, CustomEncoders,
    EncodeOptions, Encoder, MAX_NESTING_DEPTH,
};
pub use error::{EngineError, Error, Result};
pub use field::{field, FieldPath};
pub use sql::DEFAULT_DOCUMENT_COLUMN;
pub use traits::{Execute, QueryOutput, Row};
pub use value::{EnumValue, Opaque, Record, RecordField, Secret, Value, ValueKind};
