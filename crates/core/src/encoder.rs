//! Value canonicalization
//!
//! The [`Encoder`] reduces a rich [`Value`] to an [`EncodedValue`]: null,
//! boolean, number, string, array or object. It is a pure function of its
//! input and options; it never reads the clock or generates randomness.
//!
//! ## Dispatch order (first match wins)
//!
//! 1. Custom encoders, in registration order. The transform's output is
//!    encoded again unless it equals the input, in which case dispatch
//!    continues with the built-in rules below.
//! 2. JSON scalars, returned as-is.
//! 3. The default type table (addresses, paths, secrets, timestamps, dates,
//!    durations, enums, UUIDs, bytes).
//! 4. Records, encoded field by field with a fresh encoder that drops
//!    `exclude`, keeps `keep_nulls` and uses the record's own encoder table.
//! 5. Keyed mappings, with keys converted to strings.
//! 6. Lists, element by element.
//! 7. Anything else fails with [`Error::Unencodable`].
//!
//! ## Exclusion is shallow
//!
//! `exclude` names fields of the top-level record (or keys of a top-level
//! mapping). Nested values are never filtered by it.
//!
//! # Example
//!
//! ```
//! use jsondoc_core::{encode, EncodeOptions, Value};
//! use serde_json::json;
//!
//! let doc = Value::map([("name", Value::from("John")), ("age", Value::from(25))]);
//! let options = EncodeOptions::new().exclude(["age"]).keep_nulls(false);
//! assert_eq!(encode(&doc, &options).unwrap(), json!({"name": "John"}));
//! ```

use crate::error::{Error, Result};
use crate::value::{Record, Value, ValueKind};
use crate::EncodedValue;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Number};
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Maximum nesting depth the encoder will descend (100 levels)
///
/// Also bounds custom encoders whose output keeps matching themselves.
pub const MAX_NESTING_DEPTH: usize = 100;

type EncodeFn = dyn Fn(&Value) -> Option<Value> + Send + Sync;

// ============================================================================
// Custom encoders
// ============================================================================

/// A caller-supplied override: a matcher plus a transform
///
/// The transform's output is itself encoded, so it may return any [`Value`].
#[derive(Clone)]
pub struct CustomEncoder {
    label: String,
    apply: Arc<EncodeFn>,
}

impl CustomEncoder {
    /// Override for every value accepted by `matcher`
    pub fn new<M, T>(label: impl Into<String>, matcher: M, transform: T) -> Self
    where
        M: Fn(&Value) -> bool + Send + Sync + 'static,
        T: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        CustomEncoder {
            label: label.into(),
            apply: Arc::new(move |v| matcher(v).then(|| transform(v))),
        }
    }

    /// Override for opaque values whose exact runtime type is `T`
    pub fn for_type<T, F>(transform: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        CustomEncoder {
            label: std::any::type_name::<T>().to_string(),
            apply: Arc::new(move |v| match v {
                Value::Opaque(o) => o.downcast_ref::<T>().map(&transform),
                _ => None,
            }),
        }
    }

    /// Override for every value of a built-in kind
    pub fn for_kind<F>(kind: ValueKind, transform: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        CustomEncoder::new(format!("{:?}", kind), move |v| v.kind() == kind, transform)
    }

    /// Descriptive label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Transform `value` if this encoder matches it
    pub fn apply(&self, value: &Value) -> Option<Value> {
        (self.apply)(value)
    }
}

impl fmt::Debug for CustomEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomEncoder")
            .field("label", &self.label)
            .finish()
    }
}

/// Ordered table of custom encoders, checked in registration order
#[derive(Debug, Clone, Default)]
pub struct CustomEncoders(Vec<CustomEncoder>);

impl CustomEncoders {
    /// Empty table
    pub fn new() -> Self {
        CustomEncoders(Vec::new())
    }

    /// Append an encoder (builder pattern)
    pub fn with(mut self, encoder: CustomEncoder) -> Self {
        self.0.push(encoder);
        self
    }

    /// Append an encoder
    pub fn push(&mut self, encoder: CustomEncoder) {
        self.0.push(encoder);
    }

    /// Number of registered encoders
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no encoders are registered
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Registered encoders in order
    pub fn iter(&self) -> impl Iterator<Item = &CustomEncoder> {
        self.0.iter()
    }

    /// Output of the first matching encoder
    pub fn apply(&self, value: &Value) -> Option<Value> {
        self.0.iter().find_map(|e| e.apply(value))
    }
}

impl FromIterator<CustomEncoder> for CustomEncoders {
    fn from_iter<I: IntoIterator<Item = CustomEncoder>>(iter: I) -> Self {
        CustomEncoders(iter.into_iter().collect())
    }
}

// ============================================================================
// Options
// ============================================================================

/// Options for a top-level [`encode`] call
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Top-level field names to omit
    pub exclude: HashSet<String>,
    /// Keep record fields whose value is null (default: true)
    pub keep_nulls: bool,
    /// Overrides consulted before the default type table
    pub custom_encoders: CustomEncoders,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            exclude: HashSet::new(),
            keep_nulls: true,
            custom_encoders: CustomEncoders::new(),
        }
    }
}

impl EncodeOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Omit these top-level fields
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Set null handling for record fields
    pub fn keep_nulls(mut self, keep: bool) -> Self {
        self.keep_nulls = keep;
        self
    }

    /// Register a custom encoder after those already present
    pub fn with_encoder(mut self, encoder: CustomEncoder) -> Self {
        self.custom_encoders.push(encoder);
        self
    }

    /// Replace the custom encoder table
    pub fn with_encoders(mut self, encoders: CustomEncoders) -> Self {
        self.custom_encoders = encoders;
        self
    }
}

// ============================================================================
// Encoder
// ============================================================================

/// One level of an encoding pass
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'a> {
    exclude: Option<&'a HashSet<String>>,
    keep_nulls: bool,
    custom: &'a CustomEncoders,
    depth: usize,
}

impl<'a> Encoder<'a> {
    /// Top-level encoder for `options`
    pub fn new(options: &'a EncodeOptions) -> Self {
        Encoder {
            exclude: Some(&options.exclude),
            keep_nulls: options.keep_nulls,
            custom: &options.custom_encoders,
            depth: 0,
        }
    }

    /// Encode a value
    pub fn encode(&self, value: &Value) -> Result<EncodedValue> {
        if self.depth > MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep {
                depth: self.depth,
                max: MAX_NESTING_DEPTH,
            });
        }

        if let Some(replaced) = self.custom.apply(value) {
            // A transform that returns its input falls through to the built-in rules.
            if !unchanged(&replaced, value) {
                let again = Encoder {
                    depth: self.depth + 1,
                    ..*self
                };
                return again.encode(&replaced);
            }
        }

        match value {
            Value::Null => Ok(EncodedValue::Null),
            Value::Bool(b) => Ok(EncodedValue::Bool(*b)),
            Value::Int(i) => Ok(EncodedValue::Number((*i).into())),
            Value::UInt(u) => Ok(EncodedValue::Number((*u).into())),
            Value::Float(f) => float(*f, "Float"),
            Value::String(s) => Ok(EncodedValue::String(s.clone())),

            Value::IpAddr(a) => Ok(EncodedValue::String(a.to_string())),
            Value::SocketAddr(a) => Ok(EncodedValue::String(a.to_string())),
            Value::Path(p) => p
                .to_str()
                .map(|s| EncodedValue::String(s.to_string()))
                .ok_or_else(|| Error::InvalidText {
                    type_name: "Path",
                    reason: format!("{} is not valid UTF-8", p.display()),
                }),
            Value::Secret(s) => Ok(EncodedValue::String(s.expose_secret().to_string())),
            Value::Timestamp(ts) => float(epoch_seconds(ts), "Timestamp"),
            Value::Date(d) => Ok(EncodedValue::String(d.format("%Y-%m-%d").to_string())),
            Value::Duration(d) => float(total_seconds(d), "Duration"),
            Value::Enum(e) => self.nested().encode(&e.value),
            Value::Uuid(u) => Ok(EncodedValue::String(u.to_string())),
            Value::Bytes(b) => String::from_utf8(b.clone())
                .map(EncodedValue::String)
                .map_err(|e| Error::InvalidText {
                    type_name: "Bytes",
                    reason: e.to_string(),
                }),

            Value::Record(r) => self.encode_record(r),
            Value::Map(entries) => self.encode_map(entries),
            Value::List(items) => items
                .iter()
                .map(|item| self.nested().encode(item))
                .collect::<Result<Vec<_>>>()
                .map(EncodedValue::Array),

            Value::Opaque(o) => Err(Error::Unencodable {
                type_name: o.type_name().to_string(),
                reason: "no custom encoder matched".to_string(),
            }),
        }
    }

    /// Encoder for values below this level: same overrides, no exclusion
    fn nested(&self) -> Encoder<'a> {
        Encoder {
            exclude: None,
            keep_nulls: self.keep_nulls,
            custom: self.custom,
            depth: self.depth + 1,
        }
    }

    fn is_excluded(&self, key: &str) -> bool {
        self.exclude.is_some_and(|set| set.contains(key))
    }

    fn encode_record(&self, record: &Record) -> Result<EncodedValue> {
        let fields = Encoder {
            exclude: None,
            keep_nulls: self.keep_nulls,
            custom: record.encoders(),
            depth: self.depth + 1,
        };

        let mut obj = Map::new();
        for field in record.fields() {
            if self.is_excluded(&field.name) || self.is_excluded(field.key()) {
                continue;
            }
            if field.value.is_null() && !self.keep_nulls {
                continue;
            }
            obj.insert(field.key().to_string(), fields.encode(&field.value)?);
        }
        Ok(EncodedValue::Object(obj))
    }

    fn encode_map(&self, entries: &[(Value, Value)]) -> Result<EncodedValue> {
        let inner = self.nested();
        let mut obj = Map::new();
        for (key, value) in entries {
            let key = inner.map_key(key)?;
            if self.is_excluded(&key) {
                continue;
            }
            obj.insert(key, inner.encode(value)?);
        }
        Ok(EncodedValue::Object(obj))
    }

    fn map_key(&self, key: &Value) -> Result<String> {
        if let Value::Enum(e) = key {
            return self.map_key(&e.value);
        }
        match self.encode(key)? {
            EncodedValue::String(s) => Ok(s),
            EncodedValue::Number(n) => Ok(n.to_string()),
            EncodedValue::Bool(b) => Ok(b.to_string()),
            EncodedValue::Null => Ok("null".to_string()),
            other => Err(Error::Unencodable {
                type_name: key.type_name(),
                reason: format!("mapping key encodes to non-scalar {}", other),
            }),
        }
    }
}

/// Encode `value` with `options`
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<EncodedValue> {
    Encoder::new(options).encode(value)
}

/// Encode with default options
pub fn encode_value(value: impl Into<Value>) -> Result<EncodedValue> {
    encode(&value.into(), &EncodeOptions::default())
}

/// Equality for the fall-through check; floats compare by bits so NaN
/// equals itself.
fn unchanged(replaced: &Value, original: &Value) -> bool {
    match (replaced, original) {
        (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
        _ => replaced == original,
    }
}

fn float(f: f64, type_name: &str) -> Result<EncodedValue> {
    Number::from_f64(f)
        .map(EncodedValue::Number)
        .ok_or_else(|| Error::Unencodable {
            type_name: type_name.to_string(),
            reason: format!("{} is not a finite number", f),
        })
}

/// Seconds since the Unix epoch with microsecond precision
pub fn epoch_seconds(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_micros()) / 1_000_000.0
}

/// Total seconds of a duration, fractional part included
pub fn total_seconds(d: &TimeDelta) -> f64 {
    d.num_seconds() as f64 + f64::from(d.subsec_nanos()) / 1_000_000_000.0
}
