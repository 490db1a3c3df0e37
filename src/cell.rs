//! Column values as they come out of a query.
//!
//! A [`Cell`] is the closed set of shapes a single column of a single row can
//! take: SQL NULL, a scalar, a one-dimensional array, or a structured
//! (composite / JSON object) payload.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

// ============================================================================
// Interval
// ============================================================================

/// A PostgreSQL interval, kept in the same three units the server stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub microseconds: i64,
}

impl Interval {
    pub const fn new(months: i32, days: i32, microseconds: i64) -> Self {
        Self {
            months,
            days,
            microseconds,
        }
    }

    pub const fn from_days(days: i32) -> Self {
        Self::new(0, days, 0)
    }

    pub const fn from_seconds(seconds: i64) -> Self {
        Self::new(0, 0, seconds * 1_000_000)
    }
}

// ============================================================================
// Scalars
// ============================================================================

/// A non-null, non-composite column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Uuid(Uuid),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Interval(Interval),
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Short name of the runtime type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Bool(_) => "bool",
            Scalar::Text(_) => "text",
            Scalar::Uuid(_) => "uuid",
            Scalar::Timestamp(_) => "timestamp",
            Scalar::TimestampTz(_) => "timestamptz",
            Scalar::Date(_) => "date",
            Scalar::Interval(_) => "interval",
            Scalar::Bytes(_) => "bytes",
        }
    }
}

// ============================================================================
// Structured payloads
// ============================================================================

/// Ordered key/value payload of a composite or JSON object column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structured {
    entries: Vec<(String, Cell)>,
}

impl Structured {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A repeated key replaces the earlier value in place.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Cell>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Cell>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Cell>> FromIterator<(K, V)> for Structured {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Structured::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

impl Serialize for Structured {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ============================================================================
// Cell
// ============================================================================

/// One column value within one row.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Null,
    Scalar(Scalar),
    Array(Vec<Cell>),
    Structured(Structured),
}

impl Cell {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn text(s: impl Into<String>) -> Self {
        Cell::Scalar(Scalar::Text(s.into()))
    }

    pub fn array<T: Into<Cell>>(items: impl IntoIterator<Item = T>) -> Self {
        Cell::Array(items.into_iter().map(Into::into).collect())
    }

    /// Short name of the runtime shape, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Scalar(s) => s.type_name(),
            Cell::Array(_) => "array",
            Cell::Structured(_) => "structured",
        }
    }

    /// Convert a parsed JSON document into a cell tree.
    ///
    /// Numbers become `Int` when they fit an i64 and `Float` otherwise. Object
    /// members come out in `serde_json` map order, which is sorted by key.
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Cell::Null,
            JsonValue::Bool(b) => Cell::Scalar(Scalar::Bool(b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Cell::Scalar(Scalar::Int(i)),
                None => Cell::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            JsonValue::String(s) => Cell::Scalar(Scalar::Text(s)),
            JsonValue::Array(items) => {
                Cell::Array(items.into_iter().map(Cell::from_json).collect())
            }
            JsonValue::Object(map) => Cell::Structured(Structured {
                entries: map
                    .into_iter()
                    .map(|(k, v)| (k, Cell::from_json(v)))
                    .collect(),
            }),
        }
    }
}

impl From<Scalar> for Cell {
    fn from(s: Scalar) -> Self {
        Cell::Scalar(s)
    }
}

impl From<Structured> for Cell {
    fn from(s: Structured) -> Self {
        Cell::Structured(s)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

macro_rules! cell_from_scalar {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Cell {
                fn from(v: $ty) -> Self {
                    Cell::Scalar(Scalar::$variant(v $(as $cast)?))
                }
            }
        )*
    };
}

cell_from_scalar! {
    i64 => Int,
    i32 => Int as i64,
    i16 => Int as i64,
    f64 => Float,
    f32 => Float as f64,
    bool => Bool,
    String => Text,
    Uuid => Uuid,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    NaiveDate => Date,
    Interval => Interval,
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let cell = Cell::from_json(json!({"id": 1, "name": "1", "nullable": null, "ratio": 0.5}));
        let Cell::Structured(obj) = cell else {
            panic!("expected structured cell");
        };
        assert_eq!(obj.get("id"), Some(&Cell::Scalar(Scalar::Int(1))));
        assert_eq!(obj.get("name"), Some(&Cell::text("1")));
        assert_eq!(obj.get("nullable"), Some(&Cell::Null));
        assert_eq!(obj.get("ratio"), Some(&Cell::Scalar(Scalar::Float(0.5))));
        assert_eq!(obj.get("missing"), None);
    }

    #[test]
    fn test_from_json_wide_object() {
        let doc: serde_json::Map<String, JsonValue> =
            (0..2000).map(|i| (format!("k{:04}", i), json!(i))).collect();
        let Cell::Structured(obj) = Cell::from_json(JsonValue::Object(doc)) else {
            panic!("expected structured cell");
        };
        assert_eq!(obj.len(), 2000);
        assert_eq!(obj.get("k1999"), Some(&Cell::from(1999i64)));
        let keys: Vec<&str> = obj.iter().map(|(k, _)| k).take(3).collect();
        assert_eq!(keys, vec!["k0000", "k0001", "k0002"]);
    }

    #[test]
    fn test_from_json_array_keeps_order() {
        let cell = Cell::from_json(json!([3, 1, 2]));
        assert_eq!(cell, Cell::array([3i64, 1, 2]));
    }

    #[test]
    fn test_structured_insert_replaces() {
        let s = Structured::new().with("a", 1i64).with("b", "x").with("a", 2i64);
        assert_eq!(s.len(), 2);
        assert_eq!(s.get("a"), Some(&Cell::from(2i64)));
        let keys: Vec<&str> = s.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_option_into_cell() {
        assert_eq!(Cell::from(None::<String>), Cell::Null);
        assert_eq!(Cell::from(Some("qwerty")), Cell::text("qwerty"));
    }
}
