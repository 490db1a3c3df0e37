//! Error types for PostgreSQL value parsing and configuration.

use std::fmt;

/// Result type for PostgreSQL-specific operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors raised while turning server output or settings into rowkit values.
#[derive(Debug, Clone, PartialEq)]
pub enum PgError {
    /// Column data did not parse as its declared type.
    Type(String),

    /// Connection settings are invalid.
    Config(String),
}

impl fmt::Display for PgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgError::Type(msg) => write!(f, "Type error: {}", msg),
            PgError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for PgError {}
