//! Typed extraction on top of [`decode`](crate::decode()).
//!
//! A type implementing [`FromValue`] describes its own [`FieldType`] and knows
//! how to take itself out of a decoded [`Value`]. Records implement it by
//! hand:
//!
//! ```
//! use std::sync::Arc;
//! use once_cell::sync::Lazy;
//! use rowkit::{DecodeError, FieldType, FromValue, RecordShape, ScalarKind, Value};
//!
//! struct User {
//!     id: i64,
//!     email: Option<String>,
//! }
//!
//! static USER: Lazy<Arc<RecordShape>> = Lazy::new(|| {
//!     RecordShape::new("User")
//!         .field("id", i64::field_type())
//!         .field("email", Option::<String>::field_type())
//!         .build()
//! });
//!
//! impl FromValue for User {
//!     fn field_type() -> FieldType {
//!         FieldType::Record(USER.clone())
//!     }
//!
//!     fn from_value(value: Value) -> Result<Self, DecodeError> {
//!         let mut record = rowkit::convert::expect_record(value)?;
//!         Ok(User {
//!             id: record.take("id")?,
//!             email: record.take("email")?,
//!         })
//!     }
//! }
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::cell::{Interval, Scalar};
use crate::decode::decode;
use crate::error::DecodeError;
use crate::result::ResultSet;
use crate::shape::{Cardinality, FieldType, MatchMode, ScalarKind, TargetShape};
use crate::value::{Record, Value};

pub trait FromValue: Sized {
    /// Destination type used to build the decode target.
    fn field_type() -> FieldType;

    fn from_value(value: Value) -> Result<Self, DecodeError>;
}

fn mismatch(expected: &str, found: &Value) -> DecodeError {
    DecodeError::TypeMismatch {
        field: String::new(),
        expected: expected.to_string(),
        found: found.type_name(),
    }
}

/// Unwrap a record value, for hand-written `FromValue` impls.
pub fn expect_record(value: Value) -> Result<Record, DecodeError> {
    match value {
        Value::Record(r) => Ok(r),
        other => Err(mismatch("record", &other)),
    }
}

/// Raw `bytea` contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytes(pub Vec<u8>);

macro_rules! from_scalar {
    ($($ty:ty => $kind:ident, $variant:ident);* $(;)?) => {
        $(
            impl FromValue for $ty {
                fn field_type() -> FieldType {
                    FieldType::Scalar(ScalarKind::$kind)
                }

                fn from_value(value: Value) -> Result<Self, DecodeError> {
                    match value {
                        Value::Scalar(Scalar::$variant(v)) => Ok(v.into()),
                        other => Err(mismatch(ScalarKind::$kind.name(), &other)),
                    }
                }
            }
        )*
    };
}

from_scalar! {
    i64 => Int, Int;
    f64 => Float, Float;
    bool => Bool, Bool;
    String => Text, Text;
    Uuid => Uuid, Uuid;
    NaiveDateTime => Timestamp, Timestamp;
    DateTime<Utc> => TimestampTz, TimestampTz;
    NaiveDate => Date, Date;
    Interval => Interval, Interval;
    Bytes => Bytes, Bytes;
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Bytes(v)
    }
}

macro_rules! from_narrow_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn field_type() -> FieldType {
                    FieldType::Scalar(ScalarKind::Int)
                }

                fn from_value(value: Value) -> Result<Self, DecodeError> {
                    match value {
                        Value::Scalar(Scalar::Int(v)) => <$ty>::try_from(v).map_err(|_| {
                            DecodeError::TypeMismatch {
                                field: String::new(),
                                expected: stringify!($ty).to_string(),
                                found: "out-of-range int",
                            }
                        }),
                        other => Err(mismatch("int", &other)),
                    }
                }
            }
        )*
    };
}

from_narrow_int!(i32, i16);

impl FromValue for f32 {
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarKind::Float)
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Scalar(Scalar::Float(v)) if !v.is_finite() || v.abs() <= f32::MAX as f64 => {
                Ok(v as f32)
            }
            Value::Scalar(Scalar::Float(_)) => Err(DecodeError::TypeMismatch {
                field: String::new(),
                expected: "f32".to_string(),
                found: "out-of-range float",
            }),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn field_type() -> FieldType {
        T::field_type().optional()
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Absent => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn field_type() -> FieldType {
        T::field_type().sequence()
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    T::from_value(item).map_err(|e| e.with_field(&format!("[{}]", i)))
                })
                .collect(),
            other => Err(mismatch("sequence", &other)),
        }
    }
}

// ============================================================================
// Collecting rows
// ============================================================================

/// Decode every row of `result` into `T`, in order.
///
/// `mode` only matters when `T` is a record.
pub fn collect_rows<T: FromValue>(
    result: &ResultSet,
    mode: MatchMode,
) -> Result<Vec<T>, DecodeError> {
    let target = TargetShape::for_type(Cardinality::Many, T::field_type(), mode);
    match decode(result, &target)? {
        Value::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, v)| T::from_value(v).map_err(|e| e.in_row(index)))
            .collect(),
        other => Err(mismatch("sequence", &other)),
    }
}

/// Decode the only row of `result` into `T`.
pub fn collect_one_row<T: FromValue>(
    result: &ResultSet,
    mode: MatchMode,
) -> Result<T, DecodeError> {
    let target = TargetShape::for_type(Cardinality::One, T::field_type(), mode);
    T::from_value(decode(result, &target)?)
}
