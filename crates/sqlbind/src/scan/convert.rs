//! Type-conversion matrix from driver values into destination fields.
//!
//! | source      | destination                                              |
//! |-------------|----------------------------------------------------------|
//! | `Int`/`Uint`| signed/unsigned ints (range checked), `bool` (≠ 0), `String` |
//! | `Float32/64`| `f32`, `f64`                                             |
//! | `Timestamp` | `String` (layout), `NaiveDateTime`, `DateTime<Utc>`, `JsonTime` |
//! | `Bytes`     | `String` (UTF-8), parsed ints/floats/bool, `Vec<u8>`, [`UnmarshalBytes`] |
//! | `Text`      | `String`, [`UnmarshalBytes`]                            |
//! | `Bool`      | `bool`                                                   |
//!
//! Any other pairing is a [`BindError::Conversion`].

use crate::error::{BindError, BindResult, BoxError};
use crate::record::FieldKind;
use crate::value::{JsonTime, TIME_LAYOUT, Value};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Per-pass settings handed to every field assignment.
#[derive(Debug, Clone, Copy)]
pub struct BindContext<'a> {
    /// `chrono` format for timestamps bound into text fields.
    pub time_layout: &'a str,
}

impl Default for BindContext<'_> {
    fn default() -> Self {
        Self {
            time_layout: TIME_LAYOUT,
        }
    }
}

/// A destination field type reachable through the conversion matrix.
pub trait Bindable {
    const KIND: FieldKind;

    const OPTIONAL: bool = false;

    /// Assign a non-null driver value.
    fn assign(&mut self, value: &Value, ctx: &BindContext<'_>) -> BindResult<()>;
}

/// Custom decoding of a raw byte payload.
///
/// Fields declared with `#[db(unmarshal)]` hand byte (and text) values to
/// this trait instead of the conversion matrix.
pub trait UnmarshalBytes {
    fn unmarshal_bytes(&mut self, data: &[u8]) -> Result<(), BoxError>;
}

/// A field type that takes the driver value as-is.
///
/// Fields declared with `#[db(raw)]` bypass the conversion matrix.
pub trait AcceptValue {
    fn accept_value(&mut self, value: &Value) -> Result<(), BoxError>;
}

fn mismatch(value: &Value, kind: FieldKind) -> BindError {
    BindError::conversion(
        "",
        format!("cannot convert {} into {}", value.kind_name(), kind.as_str()),
    )
}

fn bytes_as_str(bytes: &[u8]) -> BindResult<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| BindError::conversion("", format!("invalid UTF-8 payload: {e}")))
}

fn parse_i64(bytes: &[u8]) -> BindResult<i64> {
    let s = bytes_as_str(bytes)?;
    s.parse::<i64>()
        .map_err(|e| BindError::conversion("", format!("cannot parse {s:?} as integer: {e}")))
}

fn parse_u64(bytes: &[u8]) -> BindResult<u64> {
    let s = bytes_as_str(bytes)?;
    s.parse::<u64>()
        .map_err(|e| BindError::conversion("", format!("cannot parse {s:?} as unsigned: {e}")))
}

fn parse_f64(bytes: &[u8]) -> BindResult<f64> {
    let s = bytes_as_str(bytes)?;
    s.parse::<f64>()
        .map_err(|e| BindError::conversion("", format!("cannot parse {s:?} as float: {e}")))
}

fn out_of_range(v: impl std::fmt::Display, ty: &str) -> BindError {
    BindError::conversion("", format!("{v} is out of range for {ty}"))
}

macro_rules! bind_signed {
    ($($t:ty),*) => {
        $(
            impl Bindable for $t {
                const KIND: FieldKind = FieldKind::Int;

                fn assign(&mut self, value: &Value, _ctx: &BindContext<'_>) -> BindResult<()> {
                    *self = match value {
                        Value::Int(v) => {
                            <$t>::try_from(*v).map_err(|_| out_of_range(v, stringify!($t)))?
                        }
                        Value::Uint(v) => {
                            <$t>::try_from(*v).map_err(|_| out_of_range(v, stringify!($t)))?
                        }
                        Value::Bytes(b) => {
                            let v = parse_i64(b)?;
                            <$t>::try_from(v).map_err(|_| out_of_range(v, stringify!($t)))?
                        }
                        other => return Err(mismatch(other, Self::KIND)),
                    };
                    Ok(())
                }
            }
        )*
    };
}

bind_signed!(i8, i16, i32, i64, isize);

macro_rules! bind_unsigned {
    ($($t:ty),*) => {
        $(
            impl Bindable for $t {
                const KIND: FieldKind = FieldKind::Uint;

                fn assign(&mut self, value: &Value, _ctx: &BindContext<'_>) -> BindResult<()> {
                    *self = match value {
                        Value::Int(v) => {
                            <$t>::try_from(*v).map_err(|_| out_of_range(v, stringify!($t)))?
                        }
                        Value::Uint(v) => {
                            <$t>::try_from(*v).map_err(|_| out_of_range(v, stringify!($t)))?
                        }
                        Value::Bytes(b) => {
                            let v = parse_u64(b)?;
                            <$t>::try_from(v).map_err(|_| out_of_range(v, stringify!($t)))?
                        }
                        other => return Err(mismatch(other, Self::KIND)),
                    };
                    Ok(())
                }
            }
        )*
    };
}

bind_unsigned!(u8, u16, u32, u64, usize);

impl Bindable for f32 {
    const KIND: FieldKind = FieldKind::Float;

    fn assign(&mut self, value: &Value, _ctx: &BindContext<'_>) -> BindResult<()> {
        *self = match value {
            Value::Float32(v) => *v,
            Value::Float64(v) => *v as f32,
            Value::Bytes(b) => parse_f64(b)? as f32,
            other => return Err(mismatch(other, Self::KIND)),
        };
        Ok(())
    }
}

impl Bindable for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn assign(&mut self, value: &Value, _ctx: &BindContext<'_>) -> BindResult<()> {
        *self = match value {
            Value::Float32(v) => f64::from(*v),
            Value::Float64(v) => *v,
            Value::Bytes(b) => parse_f64(b)?,
            other => return Err(mismatch(other, Self::KIND)),
        };
        Ok(())
    }
}

impl Bindable for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn assign(&mut self, value: &Value, _ctx: &BindContext<'_>) -> BindResult<()> {
        *self = match value {
            Value::Bool(v) => *v,
            Value::Int(v) => *v != 0,
            Value::Uint(v) => *v != 0,
            Value::Bytes(b) => parse_i64(b)? != 0,
            other => return Err(mismatch(other, Self::KIND)),
        };
        Ok(())
    }
}

impl Bindable for String {
    const KIND: FieldKind = FieldKind::String;

    fn assign(&mut self, value: &Value, ctx: &BindContext<'_>) -> BindResult<()> {
        *self = match value {
            Value::Text(s) => s.clone(),
            Value::Int(v) => v.to_string(),
            Value::Uint(v) => v.to_string(),
            Value::Timestamp(t) => t.format(ctx.time_layout).to_string(),
            Value::Bytes(b) => bytes_as_str(b)?.to_string(),
            other => return Err(mismatch(other, Self::KIND)),
        };
        Ok(())
    }
}

impl Bindable for Vec<u8> {
    const KIND: FieldKind = FieldKind::Bytes;

    fn assign(&mut self, value: &Value, _ctx: &BindContext<'_>) -> BindResult<()> {
        match value {
            Value::Bytes(b) => {
                self.clear();
                self.extend_from_slice(b);
                Ok(())
            }
            other => Err(mismatch(other, Self::KIND)),
        }
    }
}

impl Bindable for NaiveDateTime {
    const KIND: FieldKind = FieldKind::Time;

    fn assign(&mut self, value: &Value, _ctx: &BindContext<'_>) -> BindResult<()> {
        match value {
            Value::Timestamp(t) => {
                *self = *t;
                Ok(())
            }
            other => Err(mismatch(other, Self::KIND)),
        }
    }
}

impl Bindable for DateTime<Utc> {
    const KIND: FieldKind = FieldKind::Time;

    fn assign(&mut self, value: &Value, _ctx: &BindContext<'_>) -> BindResult<()> {
        match value {
            Value::Timestamp(t) => {
                *self = t.and_utc();
                Ok(())
            }
            other => Err(mismatch(other, Self::KIND)),
        }
    }
}

impl Bindable for JsonTime {
    const KIND: FieldKind = FieldKind::Time;

    fn assign(&mut self, value: &Value, _ctx: &BindContext<'_>) -> BindResult<()> {
        match value {
            Value::Timestamp(t) => {
                *self = JsonTime(*t);
                Ok(())
            }
            other => Err(mismatch(other, Self::KIND)),
        }
    }
}

impl Bindable for Value {
    const KIND: FieldKind = FieldKind::Raw;

    fn assign(&mut self, value: &Value, _ctx: &BindContext<'_>) -> BindResult<()> {
        *self = value.clone();
        Ok(())
    }
}

// Fresh storage per assignment; the field only becomes `Some` on success.
impl<T: Bindable + Default> Bindable for Option<T> {
    const KIND: FieldKind = T::KIND;

    const OPTIONAL: bool = true;

    fn assign(&mut self, value: &Value, ctx: &BindContext<'_>) -> BindResult<()> {
        let mut inner = T::default();
        inner.assign(value, ctx)?;
        *self = Some(inner);
        Ok(())
    }
}

impl AcceptValue for Value {
    fn accept_value(&mut self, value: &Value) -> Result<(), BoxError> {
        *self = value.clone();
        Ok(())
    }
}

fn unmarshal_payload(value: &Value) -> BindResult<&[u8]> {
    match value {
        Value::Bytes(b) => Ok(b),
        Value::Text(s) => Ok(s.as_bytes()),
        other => Err(mismatch(other, FieldKind::Unmarshal)),
    }
}

fn unmarshal_failed<T: ?Sized>(err: BoxError) -> BindError {
    BindError::conversion(
        "",
        format!(
            "{}::unmarshal_bytes failed: {err}",
            std::any::type_name::<T>()
        ),
    )
}

/// Hand a byte payload to a custom unmarshaler.
pub fn unmarshal_into<T: UnmarshalBytes>(field: &mut T, value: &Value) -> BindResult<()> {
    let data = unmarshal_payload(value)?;
    field.unmarshal_bytes(data).map_err(unmarshal_failed::<T>)
}

/// Like [`unmarshal_into`], decoding into fresh storage that replaces the field on success.
pub fn unmarshal_option<T: UnmarshalBytes + Default>(
    field: &mut Option<T>,
    value: &Value,
) -> BindResult<()> {
    let data = unmarshal_payload(value)?;
    let mut target = T::default();
    target.unmarshal_bytes(data).map_err(unmarshal_failed::<T>)?;
    *field = Some(target);
    Ok(())
}

/// Hand the driver value to a field that accepts it unmodified.
pub fn accept_into<T: AcceptValue>(field: &mut T, value: &Value) -> BindResult<()> {
    field
        .accept_value(value)
        .map_err(|e| BindError::conversion("", e.to_string()))
}

/// Like [`accept_into`], for an `Option` field.
pub fn accept_option<T: AcceptValue + Default>(
    field: &mut Option<T>,
    value: &Value,
) -> BindResult<()> {
    let mut target = T::default();
    accept_into(&mut target, value)?;
    *field = Some(target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn assign<T: Bindable + Default>(value: Value) -> BindResult<T> {
        let mut out = T::default();
        out.assign(&value, &BindContext::default())?;
        Ok(out)
    }

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 11, 5)
            .unwrap()
            .and_hms_opt(14, 3, 9)
            .unwrap()
    }

    #[derive(Debug, Default, PartialEq)]
    struct Csv(Vec<String>);

    impl UnmarshalBytes for Csv {
        fn unmarshal_bytes(&mut self, data: &[u8]) -> Result<(), BoxError> {
            let s = std::str::from_utf8(data)?;
            if s.is_empty() {
                return Err("empty payload".into());
            }
            self.0 = s.split(',').map(str::to_string).collect();
            Ok(())
        }
    }

    #[test]
    fn int_into_integers() {
        assert_eq!(assign::<i32>(Value::Int(18)).unwrap(), 18);
        assert_eq!(assign::<u8>(Value::Int(200)).unwrap(), 200);
        assert!(assign::<u8>(Value::Int(-1)).unwrap_err().is_conversion());
        assert!(assign::<i8>(Value::Int(1000)).unwrap_err().is_conversion());
    }

    #[test]
    fn uint_into_integers() {
        assert_eq!(assign::<u64>(Value::Uint(u64::MAX)).unwrap(), u64::MAX);
        assert_eq!(assign::<i64>(Value::Uint(5)).unwrap(), 5);
        assert!(assign::<i64>(Value::Uint(u64::MAX)).unwrap_err().is_conversion());
        assert!(assign::<bool>(Value::Uint(1)).unwrap());
        assert_eq!(
            assign::<String>(Value::Uint(u64::MAX)).unwrap(),
            "18446744073709551615"
        );
        assert!(assign::<f64>(Value::Uint(1)).is_err());
    }

    #[test]
    fn int_into_bool_and_string() {
        assert!(assign::<bool>(Value::Int(2)).unwrap());
        assert!(!assign::<bool>(Value::Int(0)).unwrap());
        assert_eq!(assign::<String>(Value::Int(-42)).unwrap(), "-42");
    }

    #[test]
    fn int_into_float_fails() {
        let err = assign::<f64>(Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Conversion failed on column '': cannot convert int into float"
        );
    }

    #[test]
    fn floats_only_into_floats() {
        assert_eq!(assign::<f64>(Value::Float32(1.5)).unwrap(), 1.5);
        assert_eq!(assign::<f32>(Value::Float64(2.25)).unwrap(), 2.25);
        assert!(assign::<i64>(Value::Float64(1.0)).is_err());
        assert!(assign::<String>(Value::Float64(1.0)).is_err());
    }

    #[test]
    fn timestamp_into_string_and_times() {
        assert_eq!(
            assign::<String>(Value::Timestamp(ts())).unwrap(),
            "2023-11-05 14:03:09"
        );
        assert_eq!(assign::<NaiveDateTime>(Value::Timestamp(ts())).unwrap(), ts());
        assert_eq!(
            assign::<DateTime<Utc>>(Value::Timestamp(ts())).unwrap(),
            ts().and_utc()
        );
        assert_eq!(assign::<JsonTime>(Value::Timestamp(ts())).unwrap(), JsonTime(ts()));
        assert!(assign::<i64>(Value::Timestamp(ts())).is_err());
    }

    #[test]
    fn timestamp_honors_layout() {
        let mut out = String::new();
        let ctx = BindContext {
            time_layout: "%d/%m/%Y",
        };
        out.assign(&Value::Timestamp(ts()), &ctx).unwrap();
        assert_eq!(out, "05/11/2023");
    }

    #[test]
    fn bytes_parse_into_scalars() {
        let b = |s: &str| Value::Bytes(s.as_bytes().to_vec());
        assert_eq!(assign::<String>(b("hello")).unwrap(), "hello");
        assert_eq!(assign::<i64>(b("-17")).unwrap(), -17);
        assert_eq!(assign::<u32>(b("17")).unwrap(), 17);
        assert_eq!(assign::<f64>(b("3.5")).unwrap(), 3.5);
        assert!(assign::<bool>(b("1")).unwrap());
        assert!(!assign::<bool>(b("0")).unwrap());
        assert!(assign::<i64>(b("abc")).unwrap_err().is_conversion());
        assert!(assign::<u64>(b("-1")).unwrap_err().is_conversion());
        assert_eq!(assign::<Vec<u8>>(b("xy")).unwrap(), b"xy".to_vec());
    }

    #[test]
    fn invalid_utf8_bytes_fail_for_string() {
        assert!(assign::<String>(Value::Bytes(vec![0xff, 0xfe])).is_err());
    }

    #[test]
    fn text_is_string_only() {
        assert_eq!(assign::<String>(Value::from("x")).unwrap(), "x");
        assert!(assign::<i64>(Value::from("1")).is_err());
    }

    #[test]
    fn bool_source() {
        assert!(assign::<bool>(Value::Bool(true)).unwrap());
        assert!(assign::<i32>(Value::Bool(true)).is_err());
    }

    #[test]
    fn option_allocates_on_value() {
        assert_eq!(assign::<Option<i64>>(Value::Int(5)).unwrap(), Some(5));
        let mut field: Option<i64> = Some(1);
        assert!(field.assign(&Value::Float64(1.0), &BindContext::default()).is_err());
        assert_eq!(field, Some(1));
        assert!(<Option<String> as Bindable>::OPTIONAL);
        assert_eq!(<Option<String> as Bindable>::KIND, FieldKind::String);
    }

    #[test]
    fn value_field_takes_anything() {
        assert_eq!(assign::<Value>(Value::Float32(1.0)).unwrap(), Value::Float32(1.0));
    }

    #[test]
    fn unmarshal_from_bytes_and_text() {
        let mut csv = Csv::default();
        unmarshal_into(&mut csv, &Value::Bytes(b"a,b".to_vec())).unwrap();
        assert_eq!(csv, Csv(vec!["a".into(), "b".into()]));

        let mut opt: Option<Csv> = None;
        unmarshal_option(&mut opt, &Value::from("x")).unwrap();
        assert_eq!(opt, Some(Csv(vec!["x".into()])));
    }

    #[test]
    fn unmarshal_failure_is_conversion() {
        let mut opt: Option<Csv> = None;
        let err = unmarshal_option(&mut opt, &Value::Bytes(vec![])).unwrap_err();
        assert!(err.to_string().contains("unmarshal_bytes failed: empty payload"));
        assert_eq!(opt, None);

        let mut csv = Csv::default();
        assert!(unmarshal_into(&mut csv, &Value::Int(1)).is_err());
    }

    #[test]
    fn accept_option_wraps() {
        let mut field: Option<Value> = None;
        accept_option(&mut field, &Value::Int(9)).unwrap();
        assert_eq!(field, Some(Value::Int(9)));
    }
}
