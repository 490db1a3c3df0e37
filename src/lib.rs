//! rowkit - typed row materialization for PostgreSQL result sets.
//!
//! A query result arrives as a [`ResultSet`] of [`Cell`]s. [`decode`] maps it
//! onto a [`TargetShape`] (single value, sequence of values, single record,
//! sequence of records), matching record fields to columns by name or by
//! position. [`collect_rows`] / [`collect_one_row`] do the same for Rust types
//! implementing [`FromValue`].

pub mod cell;
pub mod convert;
pub mod decode;
pub mod error;
pub mod executor;
pub mod pg;
pub mod result;
pub mod shape;
pub mod value;


pub use cell::{Cell, Interval, Scalar, Structured};
pub use convert::{collect_one_row, collect_rows, Bytes, FromValue};
pub use decode::decode;
pub use error::{DecodeError, Error, Result};
pub use executor::{fetch, fetch_all, fetch_one, Executor, MemoryExecutor};
pub use pg::{Oid, PgConfig};
pub use result::{ColumnDescriptor, ResultSet, Row};
pub use shape::{
    Cardinality, FieldShape, FieldType, MatchMode, RecordShape, RowShape, ScalarKind, TargetShape,
};
pub use value::{Record, Value};
