//! Static descriptions of decode targets.
//!
//! A [`RecordShape`] lists the fields of a destination record in declaration
//! order. It is meant to be built once per record type and shared through an
//! `Arc`; [`TargetShape`] pairs a row shape with how many rows are expected.

use std::fmt;
use std::sync::Arc;

/// Scalar destination types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Float,
    Bool,
    Text,
    Uuid,
    Timestamp,
    TimestampTz,
    Date,
    Interval,
    Bytes,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
            ScalarKind::Text => "text",
            ScalarKind::Uuid => "uuid",
            ScalarKind::Timestamp => "timestamp",
            ScalarKind::TimestampTz => "timestamptz",
            ScalarKind::Date => "date",
            ScalarKind::Interval => "interval",
            ScalarKind::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type of one destination slot.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Scalar(ScalarKind),
    /// NULL decodes to absent instead of failing.
    Optional(Box<FieldType>),
    Sequence(Box<FieldType>),
    Record(Arc<RecordShape>),
}

impl FieldType {
    pub fn optional(self) -> Self {
        FieldType::Optional(Box::new(self))
    }

    pub fn sequence(self) -> Self {
        FieldType::Sequence(Box::new(self))
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        matches!(self, FieldType::Optional(_))
    }
}

impl From<ScalarKind> for FieldType {
    fn from(kind: ScalarKind) -> Self {
        FieldType::Scalar(kind)
    }
}

impl From<Arc<RecordShape>> for FieldType {
    fn from(record: Arc<RecordShape>) -> Self {
        FieldType::Record(record)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(kind) => write!(f, "{}", kind),
            FieldType::Optional(inner) => write!(f, "optional {}", inner),
            FieldType::Sequence(inner) => write!(f, "sequence of {}", inner),
            FieldType::Record(record) => write!(f, "record {}", record.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    /// Column (or nested key) this field is matched against.
    pub name: String,
    pub ty: FieldType,
}

/// Ordered named fields of a destination record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordShape {
    name: String,
    fields: Vec<FieldShape>,
}

impl RecordShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        self.fields.push(FieldShape {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    /// Finish building and wrap for sharing.
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// How the top-level record's fields find their columns.
///
/// Nested structured payloads are always matched by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    ByName,
    ByPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one row.
    One,
    /// Any number of rows, including zero.
    Many,
}

/// What one row decodes into.
#[derive(Debug, Clone, PartialEq)]
pub enum RowShape {
    /// A single-column row decoded as one value.
    Value(FieldType),
    Record {
        record: Arc<RecordShape>,
        mode: MatchMode,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetShape {
    pub cardinality: Cardinality,
    pub row: RowShape,
}

impl TargetShape {
    /// Pick the row shape for a field type: records get `mode`, everything
    /// else reads a single column.
    pub fn for_type(cardinality: Cardinality, ty: FieldType, mode: MatchMode) -> Self {
        let row = match ty {
            FieldType::Record(record) => RowShape::Record { record, mode },
            other => RowShape::Value(other),
        };
        Self { cardinality, row }
    }

    pub fn scalar(ty: impl Into<FieldType>) -> Self {
        Self {
            cardinality: Cardinality::One,
            row: RowShape::Value(ty.into()),
        }
    }

    pub fn scalars(ty: impl Into<FieldType>) -> Self {
        Self {
            cardinality: Cardinality::Many,
            row: RowShape::Value(ty.into()),
        }
    }

    pub fn record(record: Arc<RecordShape>, mode: MatchMode) -> Self {
        Self {
            cardinality: Cardinality::One,
            row: RowShape::Record { record, mode },
        }
    }

    pub fn records(record: Arc<RecordShape>, mode: MatchMode) -> Self {
        Self {
            cardinality: Cardinality::Many,
            row: RowShape::Record { record, mode },
        }
    }
}
