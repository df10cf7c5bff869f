//! Decoding encoded values back into application types
//!
//! [`FromEncoded`] is the inverse of the default encoder table: a timestamp
//! encoded as epoch seconds decodes back to the same instant (to the
//! microsecond), a duration encoded as total seconds decodes to the same
//! duration, and so on. Records decode through [`Fields`].
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use jsondoc_core::{decode, encode_value};
//!
//! let ts = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
//! let encoded = encode_value(ts).unwrap();
//! assert_eq!(decode::<chrono::DateTime<Utc>>(&encoded).unwrap(), ts);
//! ```

use crate::error::{Error, Result};
use crate::value::Secret;
use crate::EncodedValue;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde_json::Map;
use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use uuid::Uuid;

/// Types that can be rebuilt from their encoded form
pub trait FromEncoded: Sized {
    /// Rebuild a value from its encoded form
    fn from_encoded(value: &EncodedValue) -> Result<Self>;
}

/// Decode an encoded value into `T`
pub fn decode<T: FromEncoded>(value: &EncodedValue) -> Result<T> {
    T::from_encoded(value)
}

fn expect_str<'a>(value: &'a EncodedValue, expected: &'static str) -> Result<&'a str> {
    value.as_str().ok_or_else(|| Error::decode(expected, value))
}

fn expect_f64(value: &EncodedValue, expected: &'static str) -> Result<f64> {
    value.as_f64().ok_or_else(|| Error::decode(expected, value))
}

fn parse_str<T: std::str::FromStr>(value: &EncodedValue, expected: &'static str) -> Result<T> {
    expect_str(value, expected)?
        .parse::<T>()
        .map_err(|_| Error::decode(expected, value))
}

/// Split fractional seconds into whole microseconds, rounding to nearest
fn seconds_to_micros(secs: f64) -> i64 {
    (secs * 1_000_000.0).round() as i64
}

impl FromEncoded for EncodedValue {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromEncoded for bool {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        value.as_bool().ok_or_else(|| Error::decode("boolean", value))
    }
}

impl FromEncoded for i64 {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        value.as_i64().ok_or_else(|| Error::decode("integer", value))
    }
}

impl FromEncoded for i32 {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        value
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| Error::decode("32-bit integer", value))
    }
}

impl FromEncoded for u64 {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        value
            .as_u64()
            .ok_or_else(|| Error::decode("unsigned integer", value))
    }
}

impl FromEncoded for u32 {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        value
            .as_u64()
            .and_then(|u| u32::try_from(u).ok())
            .ok_or_else(|| Error::decode("32-bit unsigned integer", value))
    }
}

impl FromEncoded for f64 {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        expect_f64(value, "number")
    }
}

impl FromEncoded for String {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        expect_str(value, "string").map(str::to_string)
    }
}

impl<T: FromEncoded> FromEncoded for Option<T> {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_encoded(value).map(Some)
        }
    }
}

impl<T: FromEncoded> FromEncoded for Vec<T> {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        value
            .as_array()
            .ok_or_else(|| Error::decode("array", value))?
            .iter()
            .map(T::from_encoded)
            .collect()
    }
}

impl<T: FromEncoded> FromEncoded for BTreeMap<String, T> {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        value
            .as_object()
            .ok_or_else(|| Error::decode("object", value))?
            .iter()
            .map(|(k, v)| Ok((k.clone(), T::from_encoded(v)?)))
            .collect()
    }
}

impl<T: FromEncoded> FromEncoded for HashMap<String, T> {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        value
            .as_object()
            .ok_or_else(|| Error::decode("object", value))?
            .iter()
            .map(|(k, v)| Ok((k.clone(), T::from_encoded(v)?)))
            .collect()
    }
}

/// Accepts epoch seconds (the encoded form) or an RFC 3339 string.
impl FromEncoded for DateTime<Utc> {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        if let Some(s) = value.as_str() {
            return DateTime::parse_from_rfc3339(s)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|_| Error::decode("timestamp", value));
        }
        let micros = seconds_to_micros(expect_f64(value, "timestamp")?);
        let secs = micros.div_euclid(1_000_000);
        let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
        DateTime::<Utc>::from_timestamp(secs, nanos).ok_or_else(|| Error::decode("timestamp", value))
    }
}

impl FromEncoded for NaiveDate {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        NaiveDate::parse_from_str(expect_str(value, "date")?, "%Y-%m-%d")
            .map_err(|_| Error::decode("date", value))
    }
}

impl FromEncoded for TimeDelta {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        let secs = expect_f64(value, "duration")?;
        Ok(TimeDelta::microseconds(seconds_to_micros(secs)))
    }
}

impl FromEncoded for std::time::Duration {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        let micros = seconds_to_micros(expect_f64(value, "duration")?);
        u64::try_from(micros)
            .map(std::time::Duration::from_micros)
            .map_err(|_| Error::decode("non-negative duration", value))
    }
}

impl FromEncoded for Uuid {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        parse_str(value, "uuid")
    }
}

impl FromEncoded for IpAddr {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        parse_str(value, "ip address")
    }
}

impl FromEncoded for SocketAddr {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        parse_str(value, "socket address")
    }
}

impl FromEncoded for PathBuf {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        expect_str(value, "path").map(PathBuf::from)
    }
}

impl FromEncoded for Secret {
    fn from_encoded(value: &EncodedValue) -> Result<Self> {
        expect_str(value, "secret").map(Secret::new)
    }
}

/// Borrowed view over an encoded object, for decoding records field by field
///
/// Missing fields read as null, so optional fields decode to `None`.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    obj: &'a Map<String, EncodedValue>,
}

static NULL: EncodedValue = EncodedValue::Null;

impl<'a> Fields<'a> {
    /// View `value`, which must be an object
    pub fn new(value: &'a EncodedValue) -> Result<Self> {
        value
            .as_object()
            .map(|obj| Fields { obj })
            .ok_or_else(|| Error::decode("object", value))
    }

    /// Decode one field
    pub fn get<T: FromEncoded>(&self, key: &str) -> Result<T> {
        let value = self.obj.get(key).unwrap_or(&NULL);
        T::from_encoded(value).map_err(|e| match e {
            Error::Decode { expected, found } => Error::Decode {
                expected,
                found: format!("{} in field {:?}", found, key),
            },
            other => other,
        })
    }

    /// Raw encoded field, if present
    pub fn raw(&self, key: &str) -> Option<&'a EncodedValue> {
        self.obj.get(key)
    }
}
