//! The row materializer.
//!
//! [`decode`] turns a [`ResultSet`] into a [`Value`] shaped by a
//! [`TargetShape`]. It is a pure function over its inputs: no I/O, no shared
//! state, and the first error aborts the whole call.
//!
//! Column matching is resolved once per call into a [`RowPlan`] (field →
//! column index), then every row is decoded against that plan.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::cell::{Cell, Scalar, Structured};
use crate::error::DecodeError;
use crate::result::{ColumnDescriptor, ResultSet, Row};
use crate::shape::{
    Cardinality, FieldType, MatchMode, RecordShape, RowShape, ScalarKind, TargetShape,
};
use crate::value::{Record, Value};

/// Decode a whole result set.
pub fn decode(result: &ResultSet, target: &TargetShape) -> Result<Value, DecodeError> {
    debug!(
        rows = result.len(),
        columns = result.columns().len(),
        cardinality = ?target.cardinality,
        "decoding result set"
    );

    let plan = RowPlan::resolve(result.columns(), &target.row)?;

    match target.cardinality {
        Cardinality::One => {
            if result.len() != 1 {
                return Err(DecodeError::RowCountMismatch {
                    found: result.len(),
                });
            }
            plan.decode_row(&result.rows()[0])
        }
        Cardinality::Many => {
            let mut out = Vec::with_capacity(result.len());
            for (index, row) in result.rows().iter().enumerate() {
                trace!(index, "decoding row");
                out.push(plan.decode_row(row).map_err(|e| e.in_row(index))?);
            }
            Ok(Value::Sequence(out))
        }
    }
}

// ============================================================================
// Row plan
// ============================================================================

enum RowPlan<'a> {
    Value {
        ty: &'a FieldType,
        column: &'a str,
    },
    Record {
        record: &'a RecordShape,
        /// Column index per record field, in field order.
        columns: Vec<usize>,
    },
}

impl<'a> RowPlan<'a> {
    fn resolve(columns: &'a [ColumnDescriptor], row: &'a RowShape) -> Result<Self, DecodeError> {
        match row {
            RowShape::Value(ty) => match columns {
                [only] => Ok(RowPlan::Value {
                    ty,
                    column: &only.name,
                }),
                _ => Err(DecodeError::ColumnCountMismatch {
                    expected: 1,
                    found: columns.len(),
                }),
            },
            RowShape::Record {
                record,
                mode: MatchMode::ByPosition,
            } => {
                if record.len() != columns.len() {
                    return Err(DecodeError::ColumnCountMismatch {
                        expected: record.len(),
                        found: columns.len(),
                    });
                }
                Ok(RowPlan::Record {
                    record,
                    columns: (0..columns.len()).collect(),
                })
            }
            RowShape::Record {
                record,
                mode: MatchMode::ByName,
            } => {
                let mut indices = Vec::with_capacity(record.len());
                for field in record.fields() {
                    let mut matches = columns
                        .iter()
                        .enumerate()
                        .filter(|(_, c)| c.name == field.name)
                        .map(|(i, _)| i);
                    let index = matches.next().ok_or_else(|| DecodeError::FieldNotFound {
                        field: field.name.clone(),
                    })?;
                    let extra = matches.count();
                    if extra > 0 {
                        return Err(DecodeError::DuplicateColumn {
                            column: field.name.clone(),
                            count: extra + 1,
                        });
                    }
                    indices.push(index);
                }
                Ok(RowPlan::Record {
                    record,
                    columns: indices,
                })
            }
        }
    }

    fn decode_row(&self, row: &Row) -> Result<Value, DecodeError> {
        let cells = row.cells();
        match self {
            RowPlan::Value { ty, column } => decode_cell(&cells[0], ty, &Path::Root(column)),
            RowPlan::Record { record, columns } => {
                let mut out = Record::with_capacity(record.len());
                for (field, &index) in record.fields().iter().zip(columns) {
                    let value = decode_cell(&cells[index], &field.ty, &Path::Root(&field.name))?;
                    out.push(field.name.as_str(), value);
                }
                Ok(Value::Record(out))
            }
        }
    }
}

// ============================================================================
// Field paths
// ============================================================================

/// Location of the value being decoded, rendered only when an error is built.
#[derive(Clone, Copy)]
enum Path<'a> {
    Root(&'a str),
    Field(&'a Path<'a>, &'a str),
    Index(&'a Path<'a>, usize),
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Root(name) => f.write_str(name),
            Path::Field(parent, name) => write!(f, "{}.{}", parent, name),
            Path::Index(parent, i) => write!(f, "{}[{}]", parent, i),
        }
    }
}

fn mismatch(path: &Path<'_>, expected: impl fmt::Display, found: &'static str) -> DecodeError {
    DecodeError::TypeMismatch {
        field: path.to_string(),
        expected: expected.to_string(),
        found,
    }
}

// ============================================================================
// Cell decoding
// ============================================================================

fn decode_cell(cell: &Cell, ty: &FieldType, path: &Path<'_>) -> Result<Value, DecodeError> {
    if let FieldType::Optional(inner) = ty {
        return match cell {
            Cell::Null => Ok(Value::Absent),
            _ => decode_cell(cell, inner, path),
        };
    }

    match (ty, cell) {
        (_, Cell::Null) => Err(DecodeError::UnexpectedNull {
            field: path.to_string(),
        }),
        (FieldType::Scalar(kind), Cell::Scalar(s)) => convert_scalar(s, *kind)
            .map(Value::Scalar)
            .ok_or_else(|| mismatch(path, kind, s.type_name())),
        (FieldType::Sequence(elem), Cell::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| decode_cell(item, elem, &Path::Index(path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        (FieldType::Record(record), Cell::Structured(obj)) => decode_structured(obj, record, path),
        (ty, other) => Err(mismatch(path, ty, other.type_name())),
    }
}

/// Nested payloads are self-describing, so they always match by name.
fn decode_structured(
    obj: &Structured,
    record: &RecordShape,
    path: &Path<'_>,
) -> Result<Value, DecodeError> {
    let mut out = Record::with_capacity(record.len());
    for field in record.fields() {
        let field_path = Path::Field(path, &field.name);
        let value = match obj.get(&field.name) {
            Some(cell) => decode_cell(cell, &field.ty, &field_path)?,
            None if field.ty.is_optional() => Value::Absent,
            None => {
                return Err(DecodeError::FieldNotFound {
                    field: field_path.to_string(),
                })
            }
        };
        out.push(field.name.as_str(), value);
    }
    Ok(Value::Record(out))
}

/// Apply the safe conversion list. `None` means the pair is not convertible.
fn convert_scalar(s: &Scalar, kind: ScalarKind) -> Option<Scalar> {
    match (kind, s) {
        (ScalarKind::Int, Scalar::Int(i)) => Some(Scalar::Int(*i)),
        (ScalarKind::Int, Scalar::Float(f))
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
        {
            Some(Scalar::Int(*f as i64))
        }
        (ScalarKind::Float, Scalar::Float(f)) => Some(Scalar::Float(*f)),
        (ScalarKind::Float, Scalar::Int(i)) => Some(Scalar::Float(*i as f64)),
        (ScalarKind::Bool, Scalar::Bool(b)) => Some(Scalar::Bool(*b)),
        (ScalarKind::Text, Scalar::Text(t)) => Some(Scalar::Text(t.clone())),
        (ScalarKind::Uuid, Scalar::Uuid(u)) => Some(Scalar::Uuid(*u)),
        (ScalarKind::Uuid, Scalar::Text(t)) => Uuid::parse_str(t).ok().map(Scalar::Uuid),
        (ScalarKind::Timestamp, Scalar::Timestamp(t)) => Some(Scalar::Timestamp(*t)),
        (ScalarKind::Timestamp, Scalar::Text(t)) => parse_iso_timestamp(t).map(Scalar::Timestamp),
        (ScalarKind::TimestampTz, Scalar::TimestampTz(t)) => Some(Scalar::TimestampTz(*t)),
        (ScalarKind::TimestampTz, Scalar::Text(t)) => DateTime::parse_from_rfc3339(t)
            .ok()
            .map(|d| Scalar::TimestampTz(d.with_timezone(&Utc))),
        (ScalarKind::Date, Scalar::Date(d)) => Some(Scalar::Date(*d)),
        (ScalarKind::Date, Scalar::Text(t)) => NaiveDate::parse_from_str(t, "%Y-%m-%d")
            .ok()
            .map(Scalar::Date),
        (ScalarKind::Interval, Scalar::Interval(i)) => Some(Scalar::Interval(*i)),
        (ScalarKind::Bytes, Scalar::Bytes(b)) => Some(Scalar::Bytes(b.clone())),
        _ => None,
    }
}

/// JSON renders timestamps with a `T` separator; text output uses a space.
fn parse_iso_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}
