//! Decoded output tree.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::cell::Scalar;
use crate::convert::FromValue;
use crate::error::DecodeError;

/// A materialized value, shaped like the [`TargetShape`](crate::TargetShape)
/// that produced it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// An optional slot whose source was NULL (or an omitted nested key).
    #[default]
    Absent,
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Record(Record),
}

impl Value {
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Scalar(s) => s.type_name(),
            Value::Sequence(_) => "sequence",
            Value::Record(_) => "record",
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(v: Scalar) -> Self {
        Value::Scalar(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Sequence(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Absent)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Scalar(Scalar::Text(v.to_string()))
    }
}

macro_rules! value_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Scalar(Scalar::$variant(v))
                }
            }
        )*
    };
}

value_from_scalar! {
    i64 => Int,
    f64 => Float,
    bool => Bool,
    String => Text,
    uuid::Uuid => Uuid,
}

/// Named fields in record-shape order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Move a field out as a typed value, leaving `Absent` behind.
    pub fn take<T: FromValue>(&mut self, name: &str) -> Result<T, DecodeError> {
        let slot = self
            .fields
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .ok_or_else(|| DecodeError::FieldNotFound {
                field: name.to_string(),
            })?;
        T::from_value(std::mem::take(slot)).map_err(|e| e.with_field(name))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_moves_value() {
        let mut record = Record::new().with("id", 1i64).with("name", "one");
        let id: i64 = record.take("id").unwrap();
        assert_eq!(id, 1);
        assert!(record.get("id").unwrap().is_absent());
        let name: String = record.take("name").unwrap();
        assert_eq!(name, "one");
    }

    #[test]
    fn test_take_missing_field() {
        let mut record = Record::new();
        let err = record.take::<i64>("id").unwrap_err();
        assert_eq!(
            err,
            DecodeError::FieldNotFound {
                field: "id".to_string()
            }
        );
    }

    #[test]
    fn test_take_reports_field_name() {
        let mut record = Record::new().with("id", "not a number");
        let err = record.take::<i64>("id").unwrap_err();
        assert_eq!(err.to_string(), "field 'id': cannot decode text as int");
    }
}
