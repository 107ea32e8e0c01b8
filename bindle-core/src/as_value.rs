use crate::{Error, Result, Value, truncate_long};
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use std::{any, borrow::Cow, str::FromStr};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`]
/// that bind parameters and fetched cells are expressed in.
///
/// # Error semantics
/// - Numeric conversions accept narrower widths of the same signedness and
///   range check everything else. The error names both the value and the
///   target type.
/// - `Value::Unknown` (driver native text) is parsed with the type's
///   `FromStr` implementation when one exists.
///
/// # Examples
/// ```rust
/// use bindle_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i32 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed NULL for this type. Also used as the column type in schemas.
    fn as_empty_value() -> Value;
    /// Convert into the owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn cannot_convert<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>()
    ))
}

fn parse_native<T: FromStr>(text: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.trim().parse::<T>().map_err(|e| {
        Error::new(e).context(format!(
            "Cannot parse `{}` as {}",
            truncate_long(text),
            any::type_name::<T>()
        ))
    })
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self as _))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v), ..) => Ok(v as _),
                    $($pat_rest => $expr_rest,)*
                    #[allow(unreachable_patterns)]
                    Value::Int64(Some(v), ..) => <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {v}: i64 is out of range for {}",
                            any::type_name::<Self>(),
                        ))
                    }),
                    #[allow(unreachable_patterns)]
                    Value::UInt64(Some(v), ..) => <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {v}: u64 is out of range for {}",
                            any::type_name::<Self>(),
                        ))
                    }),
                    Value::Unknown(Some(ref v), ..) => parse_native(v),
                    _ => Err(cannot_convert::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value!(i8, Value::Int8);
impl_as_value!(
    i16,
    Value::Int16,
    Value::Int8(Some(v), ..) => Ok(v as _),
    Value::UInt8(Some(v), ..) => Ok(v as _),
);
impl_as_value!(
    i32,
    Value::Int32,
    Value::Int16(Some(v), ..) => Ok(v as _),
    Value::Int8(Some(v), ..) => Ok(v as _),
    Value::UInt16(Some(v), ..) => Ok(v as _),
    Value::UInt8(Some(v), ..) => Ok(v as _),
);
impl_as_value!(
    i64,
    Value::Int64,
    Value::Int32(Some(v), ..) => Ok(v as _),
    Value::Int16(Some(v), ..) => Ok(v as _),
    Value::Int8(Some(v), ..) => Ok(v as _),
    Value::UInt32(Some(v), ..) => Ok(v as _),
    Value::UInt16(Some(v), ..) => Ok(v as _),
    Value::UInt8(Some(v), ..) => Ok(v as _),
    Value::Decimal(Some(v), ..) => {
        let error = Error::msg(format!("Value {v}: Decimal does not fit into i64"));
        if !v.is_integer() {
            return Err(error.context("The value is not a integer"));
        }
        v.to_i64().ok_or(error)
    }
);
impl_as_value!(
    i128,
    Value::Int128,
    Value::Int32(Some(v), ..) => Ok(v as _),
    Value::Int16(Some(v), ..) => Ok(v as _),
    Value::Int8(Some(v), ..) => Ok(v as _),
    Value::UInt32(Some(v), ..) => Ok(v as _),
    Value::UInt16(Some(v), ..) => Ok(v as _),
    Value::UInt8(Some(v), ..) => Ok(v as _),
);
impl_as_value!(u8, Value::UInt8);
impl_as_value!(
    u16,
    Value::UInt16,
    Value::UInt8(Some(v), ..) => Ok(v as _),
);
impl_as_value!(
    u32,
    Value::UInt32,
    Value::UInt16(Some(v), ..) => Ok(v as _),
    Value::UInt8(Some(v), ..) => Ok(v as _),
);
impl_as_value!(
    u64,
    Value::UInt64,
    Value::UInt32(Some(v), ..) => Ok(v as _),
    Value::UInt16(Some(v), ..) => Ok(v as _),
    Value::UInt8(Some(v), ..) => Ok(v as _),
);
impl_as_value!(
    u128,
    Value::UInt128,
    Value::UInt32(Some(v), ..) => Ok(v as _),
    Value::UInt16(Some(v), ..) => Ok(v as _),
    Value::UInt8(Some(v), ..) => Ok(v as _),
);

fn parse_bool(text: &str) -> Result<bool> {
    match text.trim() {
        x if ["true", "t", "1"].iter().any(|v| x.eq_ignore_ascii_case(v)) => Ok(true),
        x if ["false", "f", "0"].iter().any(|v| x.eq_ignore_ascii_case(v)) => Ok(false),
        x => Err(Error::msg(format!(
            "Cannot parse `{}` as bool",
            truncate_long(x)
        ))),
    }
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v), ..) => Ok(v.into()),
                    $($pat_rest => $expr_rest,)*
                    _ => Err(cannot_convert::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value!(
    bool,
    Value::Boolean,
    Value::Int8(Some(v), ..) => Ok(v != 0),
    Value::Int16(Some(v), ..) => Ok(v != 0),
    Value::Int32(Some(v), ..) => Ok(v != 0),
    Value::Int64(Some(v), ..) => Ok(v != 0),
    Value::UInt8(Some(v), ..) => Ok(v != 0),
    Value::UInt16(Some(v), ..) => Ok(v != 0),
    Value::UInt32(Some(v), ..) => Ok(v != 0),
    Value::UInt64(Some(v), ..) => Ok(v != 0),
    Value::Unknown(Some(ref v), ..) => parse_bool(v),
);
impl_as_value!(
    f32,
    Value::Float32,
    Value::Unknown(Some(ref v), ..) => parse_native(v),
);
impl_as_value!(
    f64,
    Value::Float64,
    Value::Float32(Some(v), ..) => Ok(v as _),
    Value::Decimal(Some(v), ..) => v
        .to_f64()
        .ok_or_else(|| Error::msg(format!("Value {v}: Decimal does not fit into f64"))),
    Value::Unknown(Some(ref v), ..) => parse_native(v),
);
impl_as_value!(
    String,
    Value::Varchar,
    Value::Unknown(Some(v), ..) => Ok(v),
);
impl_as_value!(Box<[u8]>, Value::Blob);
impl_as_value!(Date, Value::Date);
impl_as_value!(Time, Value::Time);
impl_as_value!(PrimitiveDateTime, Value::Timestamp);
impl_as_value!(
    OffsetDateTime,
    Value::TimestampWithTimezone,
    Value::Timestamp(Some(timestamp), ..) => Ok(timestamp.assume_utc()),
);
impl_as_value!(
    Uuid,
    Value::Uuid,
    Value::Varchar(Some(ref v), ..) => Uuid::parse_str(v)
        .map_err(|e| Error::new(e).context(format!("Cannot parse `{}` as uuid", truncate_long(v)))),
    Value::Unknown(Some(ref v), ..) => parse_native(v),
);

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None, 0, 0)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self), 0, self.scale() as _)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v), ..) => Ok(v),
            Value::Int8(Some(v), ..) => Ok(Decimal::new(v as i64, 0)),
            Value::Int16(Some(v), ..) => Ok(Decimal::new(v as i64, 0)),
            Value::Int32(Some(v), ..) => Ok(Decimal::new(v as i64, 0)),
            Value::Int64(Some(v), ..) => Ok(Decimal::new(v, 0)),
            Value::UInt8(Some(v), ..) => Ok(Decimal::new(v as i64, 0)),
            Value::UInt16(Some(v), ..) => Ok(Decimal::new(v as i64, 0)),
            Value::UInt32(Some(v), ..) => Ok(Decimal::new(v as i64, 0)),
            Value::Float32(Some(v), ..) => {
                Decimal::from_f32(v).ok_or_else(|| cannot_convert::<Self>(&value))
            }
            Value::Float64(Some(v), ..) => {
                Decimal::from_f64(v).ok_or_else(|| cannot_convert::<Self>(&value))
            }
            Value::Unknown(Some(ref v), ..) => parse_native(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl<'a> AsValue for Cow<'a, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into_owned()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Cow::Owned)
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_empty_value() -> Value {
        Value::List(None, Box::new(T::as_empty_value()))
    }
    fn as_value(self) -> Value {
        Value::List(
            Some(self.into_iter().map(AsValue::as_value).collect()),
            Box::new(T::as_empty_value()),
        )
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(Some(v), ..) => v.into_iter().map(T::try_from_value).collect(),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}
