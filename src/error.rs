//! Error types for rowkit.
//!
//! [`DecodeError`] is the materializer taxonomy; [`Error`] is what the
//! query-and-decode helpers return and also covers upstream failures.

use thiserror::Error;

use crate::pg::PgError;

/// Why a result set could not be materialized into the requested shape.
///
/// Every variant is terminal for the `decode` call that produced it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("expected {expected} columns, result has {found}")]
    ColumnCountMismatch { expected: usize, found: usize },

    #[error("no column or key named '{field}'")]
    FieldNotFound { field: String },

    #[error("column '{column}' appears {count} times, cannot match by name")]
    DuplicateColumn { column: String, count: usize },

    #[error("field '{field}': cannot decode {found} as {expected}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    #[error("field '{field}': unexpected NULL")]
    UnexpectedNull { field: String },

    #[error("expected exactly one row, got {found}")]
    RowCountMismatch { found: usize },

    #[error("row {index}: {source}")]
    Row {
        index: usize,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Attach a row index, used by the sequence decoders.
    pub(crate) fn in_row(self, index: usize) -> Self {
        DecodeError::Row {
            index,
            source: Box::new(self),
        }
    }

    /// Place a typed-conversion error under `name`: an empty path becomes
    /// `name`, a set path becomes `name.path` (or `name[i]...`).
    pub(crate) fn with_field(self, name: &str) -> Self {
        match self {
            DecodeError::TypeMismatch {
                field,
                expected,
                found,
            } => DecodeError::TypeMismatch {
                field: nest_path(name, field),
                expected,
                found,
            },
            DecodeError::UnexpectedNull { field } => DecodeError::UnexpectedNull {
                field: nest_path(name, field),
            },
            DecodeError::FieldNotFound { field } => DecodeError::FieldNotFound {
                field: nest_path(name, field),
            },
            other => other,
        }
    }

    /// The innermost error, skipping row wrappers.
    pub fn root(&self) -> &DecodeError {
        match self {
            DecodeError::Row { source, .. } => source.root(),
            other => other,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Query execution error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Type conversion error: {0}")]
    Type(String),

    #[error("Parameter count mismatch: query expects {expected}, got {found}")]
    ParamCount { expected: usize, found: usize },

    #[error("Malformed result set: {0}")]
    Shape(String),
}

impl From<PgError> for Error {
    fn from(err: PgError) -> Error {
        match err {
            PgError::Type(msg) => Error::Type(msg),
            PgError::Config(msg) => Error::Config(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn nest_path(outer: &str, inner: String) -> String {
    if inner.is_empty() {
        outer.to_string()
    } else if inner.starts_with('[') {
        format!("{}{}", outer, inner)
    } else {
        format!("{}.{}", outer, inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unwraps_rows() {
        let err = DecodeError::UnexpectedNull {
            field: "id".to_string(),
        }
        .in_row(3);
        assert_eq!(err.to_string(), "row 3: field 'id': unexpected NULL");
        assert!(matches!(err.root(), DecodeError::UnexpectedNull { .. }));
    }

    #[test]
    fn test_with_field_nests_paths() {
        let err = DecodeError::TypeMismatch {
            field: String::new(),
            expected: "i32".to_string(),
            found: "int",
        };
        let named = err.with_field("id").with_field("[1]").with_field("slice");
        assert_eq!(
            named.to_string(),
            "field 'slice[1].id': cannot decode int as i32"
        );

        let missing = DecodeError::FieldNotFound {
            field: "id".to_string(),
        }
        .with_field("simple_struct");
        assert_eq!(
            missing,
            DecodeError::FieldNotFound {
                field: "simple_struct.id".to_string()
            }
        );
    }

    #[test]
    fn test_pg_error_conversion() {
        let err: Error = PgError::Type("bad int".to_string()).into();
        assert!(matches!(err, Error::Type(_)));
        let err: Error = PgError::Config("bad port".to_string()).into();
        assert!(matches!(err, Error::Config(_)));
    }
}
