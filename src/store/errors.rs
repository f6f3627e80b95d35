//! Store error types
//!
//! Store errors cross into the executor verbatim as storage failures; nothing
//! in the query core retries them.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a record store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend I/O or internal failure
    #[error("storage backend failure: {0}")]
    Backend(String),

    /// The store has no index for the requested field(s)
    #[error("no index on '{0}'")]
    NotIndexed(String),

    /// Write rejected because the record lacks a primary-key field
    #[error("record is missing primary-key field '{0}'")]
    MissingPrimaryKey(String),

    /// Write rejected by a unique index
    #[error("duplicate value for unique field '{0}'")]
    UniqueViolation(String),
}

impl StoreError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Backend(_) => "AERO_STORE_BACKEND",
            StoreError::NotIndexed(_) => "AERO_STORE_NOT_INDEXED",
            StoreError::MissingPrimaryKey(_) => "AERO_STORE_MISSING_PRIMARY_KEY",
            StoreError::UniqueViolation(_) => "AERO_STORE_UNIQUE_VIOLATION",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::NotIndexed("age".into());
        assert_eq!(err.to_string(), "no index on 'age'");
        assert_eq!(err.code(), "AERO_STORE_NOT_INDEXED");
    }
}
