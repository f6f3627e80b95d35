//! Catalog error types

use thiserror::Error;

/// Result type for catalog construction
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Schema metadata cannot form a valid index catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// No primary-key fields declared
    #[error("record type '{0}' declares no primary key")]
    EmptyPrimaryKey(String),

    /// A field appears twice in the primary key
    #[error("record type '{record_type}' repeats primary-key field '{field}'")]
    DuplicatePrimaryKeyField { record_type: String, field: String },

    /// Compound index with fewer than two distinct fields
    #[error("record type '{record_type}' declares an invalid compound index {fields:?}")]
    InvalidCompoundIndex {
        record_type: String,
        fields: Vec<String>,
    },
}

impl CatalogError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::EmptyPrimaryKey(_) => "AERO_CATALOG_EMPTY_PRIMARY_KEY",
            CatalogError::DuplicatePrimaryKeyField { .. } => "AERO_CATALOG_DUPLICATE_KEY_FIELD",
            CatalogError::InvalidCompoundIndex { .. } => "AERO_CATALOG_INVALID_COMPOUND_INDEX",
        }
    }
}
