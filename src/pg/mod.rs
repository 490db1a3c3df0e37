//! PostgreSQL specifics.
//!
//! Architecture:
//! - `types`: type OIDs and text-format value parsing into `Cell`s
//! - `config`: connection settings and connection-string rendering
//! - `error`: parse and config errors
//!
//! The wire protocol and pooling are left to whichever client library feeds
//! rows in; [`result_set_from_text`] is the hand-off point for drivers that
//! return text-format columns.

pub mod config;
pub mod error;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{PgConfig, SslMode};
pub use error::{PgError, PgResult};
pub use types::{decode_text, Oid};

use crate::error::{Error, Result};
use crate::result::{ColumnDescriptor, ResultSet};

/// Build a [`ResultSet`] from text-format column data (`None` is SQL NULL).
pub fn result_set_from_text<'a, R>(columns: Vec<ColumnDescriptor>, rows: R) -> Result<ResultSet>
where
    R: IntoIterator,
    R::Item: AsRef<[Option<&'a str>]>,
{
    let mut result = ResultSet::new(columns);
    for raw in rows {
        let raw = raw.as_ref();
        if raw.len() != result.columns().len() {
            return Err(Error::Shape(format!(
                "row {} has {} values, expected {}",
                result.len(),
                raw.len(),
                result.columns().len()
            )));
        }
        let cells = result
            .columns()
            .iter()
            .zip(raw)
            .map(|(col, data)| decode_text(col.type_oid, data.map(str::as_bytes)))
            .collect::<PgResult<Vec<_>>>()?;
        result.push_row(cells)?;
    }
    Ok(result)
}
