//! Application value model
//!
//! [`Value`] is the rich, pre-encoding form of anything a caller stores in a
//! document or uses as a predicate/update operand. It covers the JSON scalars
//! plus the common non-JSON types (timestamps, dates, durations, UUIDs,
//! network addresses, paths, secrets, bytes), enumerated values, structured
//! records, keyed mappings and collections.
//!
//! Values reach the engine only after passing through the
//! [`Encoder`](crate::encoder::Encoder), which reduces them to an
//! [`EncodedValue`](crate::EncodedValue).
//!
//! ## Conversions
//!
//! Most Rust types convert with `Into<Value>`:
//!
//! ```
//! use jsondoc_core::Value;
//! use std::collections::BTreeMap;
//!
//! let v: Value = 42.into();
//! assert_eq!(v, Value::Int(42));
//!
//! let tags: Value = vec!["a", "b"].into();
//! assert!(matches!(tags, Value::List(_)));
//!
//! let mut scores = BTreeMap::new();
//! scores.insert("math", 90);
//! let v: Value = scores.into();
//! assert!(matches!(v, Value::Map(_)));
//! ```

use crate::encoder::CustomEncoders;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use uuid::Uuid;

/// A rich application value prior to encoding
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null / absent
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer beyond the signed range
    UInt(u64),
    /// Floating point
    Float(f64),
    /// UTF-8 text
    String(String),
    /// Raw bytes, encoded as UTF-8 text
    Bytes(Vec<u8>),
    /// Absolute point in time
    Timestamp(DateTime<Utc>),
    /// Calendar date
    Date(NaiveDate),
    /// Signed duration
    Duration(TimeDelta),
    /// UUID
    Uuid(Uuid),
    /// IP address
    IpAddr(IpAddr),
    /// Socket address (IP and port)
    SocketAddr(SocketAddr),
    /// Filesystem path
    Path(PathBuf),
    /// Secret text, revealed when encoded
    Secret(Secret),
    /// Enumerated value carrying an underlying scalar
    Enum(EnumValue),
    /// Structured record with named fields
    Record(Record),
    /// Keyed mapping in insertion order
    Map(Vec<(Value, Value)>),
    /// Ordered collection
    List(Vec<Value>),
    /// Arbitrary Rust value that only a custom encoder can handle
    Opaque(Opaque),
}

/// Discriminant of a [`Value`], used to target built-in kinds with custom encoders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Null`]
    Null,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Int`]
    Int,
    /// [`Value::UInt`]
    UInt,
    /// [`Value::Float`]
    Float,
    /// [`Value::String`]
    String,
    /// [`Value::Bytes`]
    Bytes,
    /// [`Value::Timestamp`]
    Timestamp,
    /// [`Value::Date`]
    Date,
    /// [`Value::Duration`]
    Duration,
    /// [`Value::Uuid`]
    Uuid,
    /// [`Value::IpAddr`]
    IpAddr,
    /// [`Value::SocketAddr`]
    SocketAddr,
    /// [`Value::Path`]
    Path,
    /// [`Value::Secret`]
    Secret,
    /// [`Value::Enum`]
    Enum,
    /// [`Value::Record`]
    Record,
    /// [`Value::Map`]
    Map,
    /// [`Value::List`]
    List,
    /// [`Value::Opaque`]
    Opaque,
}

impl Value {
    /// The kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Date(_) => ValueKind::Date,
            Value::Duration(_) => ValueKind::Duration,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::IpAddr(_) => ValueKind::IpAddr,
            Value::SocketAddr(_) => ValueKind::SocketAddr,
            Value::Path(_) => ValueKind::Path,
            Value::Secret(_) => ValueKind::Secret,
            Value::Enum(_) => ValueKind::Enum,
            Value::Record(_) => ValueKind::Record,
            Value::Map(_) => ValueKind::Map,
            Value::List(_) => ValueKind::List,
            Value::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// Human-readable type name, used in error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Enum(e) => e.type_name.clone(),
            Value::Record(r) => r.type_name.clone(),
            Value::Opaque(o) => o.type_name.to_string(),
            other => format!("{:?}", other.kind()),
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is already a JSON scalar
    pub fn is_json_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Bool(_)
                | Value::Int(_)
                | Value::UInt(_)
                | Value::Float(_)
                | Value::String(_)
        )
    }

    /// Raw bytes value
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    /// Wrap an arbitrary Rust value; encoding it requires a matching custom encoder
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Opaque::new(value))
    }

    /// Build a keyed mapping from entries
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ============================================================================
// Secret
// ============================================================================

/// Secret text that never appears in `Debug` or `Display` output
///
/// Encoding a secret for storage necessarily reveals it. Exclude secret fields
/// before encoding for any untrusted destination.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Secret(String);

impl Secret {
    /// Wrap secret text
    pub fn new(secret: impl Into<String>) -> Self {
        Secret(secret.into())
    }

    /// Reveal the underlying text
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(\"**********\")")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("**********")
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Secret::new(s)
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Secret(s)
    }
}

// ============================================================================
// EnumValue
// ============================================================================

/// An enumerated value: a named variant backed by a scalar
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    /// Declaring type
    pub type_name: String,
    /// Variant name
    pub variant: String,
    /// Underlying value emitted by the encoder
    pub value: Box<Value>,
}

impl EnumValue {
    /// Create an enumerated value
    pub fn new(
        type_name: impl Into<String>,
        variant: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        EnumValue {
            type_name: type_name.into(),
            variant: variant.into(),
            value: Box::new(value.into()),
        }
    }
}

// ============================================================================
// Record
// ============================================================================

/// One named field of a [`Record`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    /// Declared field name
    pub name: String,
    /// Serialization alias, emitted instead of the name when present
    pub alias: Option<String>,
    /// Field value
    pub value: Value,
}

impl RecordField {
    /// The key this field is emitted under
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A structured value with named fields and an optional per-type encoder table
///
/// # Example
///
/// ```
/// use jsondoc_core::{Record, Value};
///
/// let address = Record::new("Address")
///     .field("city", "Lisbon")
///     .aliased_field("postal_code", "zip", "1100-148");
/// let v: Value = address.into();
/// assert!(matches!(v, Value::Record(_)));
/// ```
#[derive(Debug, Clone)]
pub struct Record {
    type_name: String,
    fields: Vec<RecordField>,
    encoders: CustomEncoders,
}

impl Record {
    /// Create an empty record of the given declared type
    pub fn new(type_name: impl Into<String>) -> Self {
        Record {
            type_name: type_name.into(),
            fields: Vec::new(),
            encoders: CustomEncoders::new(),
        }
    }

    /// Append a field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(RecordField {
            name: name.into(),
            alias: None,
            value: value.into(),
        });
        self
    }

    /// Append a field emitted under a serialization alias
    pub fn aliased_field(
        mut self,
        name: impl Into<String>,
        alias: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.fields.push(RecordField {
            name: name.into(),
            alias: Some(alias.into()),
            value: value.into(),
        });
        self
    }

    /// Attach the per-type encoder table used for this record's fields
    pub fn with_encoders(mut self, encoders: CustomEncoders) -> Self {
        self.encoders = encoders;
        self
    }

    /// Declared type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    /// Per-type encoder table
    pub fn encoders(&self) -> &CustomEncoders {
        &self.encoders
    }

    /// Look up a field by declared name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

// Encoder tables are behaviour, not data.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.fields == other.fields
    }
}

// ============================================================================
// Opaque
// ============================================================================

/// A type-erased Rust value
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    /// Wrap a value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Opaque {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// Name of the wrapped Rust type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the wrapped value if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Check the wrapped value's exact type
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_name)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::UInt(v),
        }
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::from(v as u64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::String(c.to_string())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<VecDeque<T>> for Value {
    fn from(v: VecDeque<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<HashSet<T>> for Value {
    fn from(v: HashSet<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeSet<T>> for Value {
    fn from(v: BTreeSet<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::List(v.iter().cloned().map(Into::into).collect())
    }
}

impl<K: Into<Value>, V: Into<Value>> From<HashMap<K, V>> for Value {
    fn from(m: HashMap<K, V>) -> Self {
        Value::map(m)
    }
}

impl<K: Into<Value>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(m: BTreeMap<K, V>) -> Self {
        Value::map(m)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => Value::Map(
                obj.into_iter()
                    .map(|(k, v)| (Value::String(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Value::Timestamp(ts.with_timezone(&Utc))
    }
}

/// Naive date-times are interpreted as UTC.
impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts.and_utc())
    }
}

impl From<SystemTime> for Value {
    fn from(t: SystemTime) -> Self {
        Value::Timestamp(DateTime::<Utc>::from(t))
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<TimeDelta> for Value {
    fn from(d: TimeDelta) -> Self {
        Value::Duration(d)
    }
}

/// Durations beyond `TimeDelta::MAX` saturate.
impl From<std::time::Duration> for Value {
    fn from(d: std::time::Duration) -> Self {
        Value::Duration(TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX))
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<IpAddr> for Value {
    fn from(a: IpAddr) -> Self {
        Value::IpAddr(a)
    }
}

impl From<Ipv4Addr> for Value {
    fn from(a: Ipv4Addr) -> Self {
        Value::IpAddr(IpAddr::V4(a))
    }
}

impl From<Ipv6Addr> for Value {
    fn from(a: Ipv6Addr) -> Self {
        Value::IpAddr(IpAddr::V6(a))
    }
}

impl From<SocketAddr> for Value {
    fn from(a: SocketAddr) -> Self {
        Value::SocketAddr(a)
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Value::Path(p)
    }
}

impl From<&Path> for Value {
    fn from(p: &Path) -> Self {
        Value::Path(p.to_path_buf())
    }
}

impl From<Secret> for Value {
    fn from(s: Secret) -> Self {
        Value::Secret(s)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<Opaque> for Value {
    fn from(o: Opaque) -> Self {
        Value::Opaque(o)
    }
}
