//! Runtime values for statement arguments and row cells.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Default layout used when rendering a timestamp as text.
pub const TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// An opaque driver value.
///
/// Used for statement arguments and for the cells of a result row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// NULL
    #[default]
    Null,

    /// Boolean
    Bool(bool),

    /// Signed integer (drivers widen every integer column to 64 bits)
    Int(i64),

    /// Unsigned integer too wide for `Int` (`u64`, `usize`)
    Uint(u64),

    /// 32-bit float
    Float32(f32),

    /// 64-bit float
    Float64(f64),

    /// Text
    Text(String),

    /// Raw bytes; drivers may hand textual or numeric columns back this way
    Bytes(Vec<u8>),

    /// Timestamp without time zone
    Timestamp(NaiveDateTime),
}

/// A row of data as column name → value pairs, ordered by column name.
pub type ValueMap = BTreeMap<String, Value>;

impl Value {
    /// Returns true if this is a NULL value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the runtime kind, used in conversion errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Decode byte values as text; every other value is returned unchanged.
    pub fn into_text_decoded(self) -> Value {
        match self {
            Value::Bytes(b) => match String::from_utf8(b) {
                Ok(s) => Value::Text(s),
                Err(e) => Value::Text(String::from_utf8_lossy(e.as_bytes()).into_owned()),
            },
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Bytes(v) => f.write_str(&String::from_utf8_lossy(v)),
            Value::Timestamp(v) => write!(f, "{}", v.format(TIME_LAYOUT)),
        }
    }
}

/// Conversion of a Rust value into a [`Value`] argument.
///
/// `is_zero` reports whether the value equals its type's zero value. Record
/// normalization treats zero fields as unset and leaves them out of the
/// column list.
pub trait ToValue {
    fn to_value(&self) -> Value;

    fn is_zero(&self) -> bool;
}

macro_rules! int_to_value {
    ($variant:ident as $wide:ty: $($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::$variant(<$wide>::from(*self))
                }

                fn is_zero(&self) -> bool {
                    *self == 0
                }
            }

            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    v.to_value()
                }
            }
        )*
    };
}

int_to_value!(Int as i64: i8, i16, i32, i64, u8, u16, u32);
int_to_value!(Uint as u64: u64);

// Pointer-sized integers have no lossless `From` into 64 bits on every target.
impl ToValue for isize {
    fn to_value(&self) -> Value {
        Value::Int(*self as i64)
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }
}

impl ToValue for usize {
    fn to_value(&self) -> Value {
        Value::Uint(*self as u64)
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }
}

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        v.to_value()
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        v.to_value()
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float32(*self)
    }

    // Bitwise: `-0.0` is a set value.
    fn is_zero(&self) -> bool {
        self.to_bits() == 0
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float64(*self)
    }

    fn is_zero(&self) -> bool {
        self.to_bits() == 0
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl ToValue for &str {
    fn to_value(&self) -> Value {
        Value::Text((*self).to_string())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn is_zero(&self) -> bool {
        *self == NaiveDateTime::default()
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.naive_utc())
    }

    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }

    fn is_zero(&self) -> bool {
        self.is_null()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.naive_utc())
    }
}

impl From<JsonTime> for Value {
    fn from(v: JsonTime) -> Self {
        Value::Timestamp(v.0)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// A timestamp that renders as `YYYY-MM-DD HH:MM:SS`.
///
/// The zero value renders as `0000-00-00 00:00:00`, and JSON serialization
/// emits the same text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct JsonTime(pub NaiveDateTime);

impl JsonTime {
    pub fn time(&self) -> NaiveDateTime {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == NaiveDateTime::default()
    }
}

impl From<NaiveDateTime> for JsonTime {
    fn from(t: NaiveDateTime) -> Self {
        JsonTime(t)
    }
}

impl fmt::Display for JsonTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0000-00-00 00:00:00");
        }
        write!(f, "{}", self.0.format(TIME_LAYOUT))
    }
}

impl Serialize for JsonTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl ToValue for JsonTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.0)
    }

    fn is_zero(&self) -> bool {
        JsonTime::is_zero(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn zero_values() {
        assert!(0_i32.is_zero());
        assert!(!18_i64.is_zero());
        assert!(String::new().is_zero());
        assert!(!false.to_value().is_null());
        assert!(Option::<i64>::None.is_zero());
        assert!(!Some(0_i64).is_zero());
    }

    #[test]
    fn wide_unsigned_keeps_its_value() {
        assert_eq!(u64::MAX.to_value(), Value::Uint(u64::MAX));
        assert_eq!(Value::from(usize::MAX), Value::Uint(usize::MAX as u64));
        assert_eq!(Value::from(7_u32), Value::Int(7));
        assert_eq!(Value::Uint(u64::MAX).to_string(), "18446744073709551615");
    }

    #[test]
    fn negative_zero_float_is_set() {
        assert!(0.0_f64.is_zero());
        assert!(!(-0.0_f64).is_zero());
        assert!(0.0_f32.is_zero());
        assert!(!(-0.0_f32).is_zero());
    }

    #[test]
    fn option_into_value() {
        assert_eq!(Value::from(Some(18_i32)), Value::Int(18));
        assert_eq!(Value::from(Option::<&str>::None), Value::Null);
    }

    #[test]
    fn bytes_decode_as_text() {
        let v = Value::Bytes(b"alice".to_vec()).into_text_decoded();
        assert_eq!(v, Value::Text("alice".to_string()));
        assert_eq!(Value::Int(3).into_text_decoded(), Value::Int(3));
    }

    #[test]
    fn json_time_renders_layout() {
        let t = JsonTime(ts(2024, 3, 9, 7, 5, 1));
        assert_eq!(t.to_string(), "2024-03-09 07:05:01");
        assert_eq!(
            serde_json::to_string(&t).unwrap(),
            "\"2024-03-09 07:05:01\""
        );
    }

    #[test]
    fn json_time_zero_renders_zero_date() {
        assert_eq!(JsonTime::default().to_string(), "0000-00-00 00:00:00");
    }

    #[test]
    fn display_timestamp_uses_layout() {
        let v = Value::Timestamp(ts(2020, 1, 2, 3, 4, 5));
        assert_eq!(v.to_string(), "2020-01-02 03:04:05");
    }
}
