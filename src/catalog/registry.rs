//! Process-lifetime catalog cache
//!
//! One catalog per record type, built on first use and shared afterwards.
//! The registry is an explicit value owned by the host, not a global.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::catalog::{IndexCatalog, SchemaSource};
use super::errors::CatalogResult;

/// Cache of index catalogs keyed by record type
#[derive(Debug, Default)]
pub struct CatalogRegistry {
    catalogs: RwLock<HashMap<String, Arc<IndexCatalog>>>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached catalog for the schema's record type, building it
    /// from the schema on first request
    pub fn get_or_build(&self, schema: &dyn SchemaSource) -> CatalogResult<Arc<IndexCatalog>> {
        if let Some(catalog) = self.get(schema.record_type()) {
            return Ok(catalog);
        }

        let built = Arc::new(IndexCatalog::from_schema(schema)?);
        let mut catalogs = self.catalogs.write().unwrap_or_else(PoisonError::into_inner);
        // A concurrent builder may have won; keep the first catalog
        let entry = catalogs
            .entry(schema.record_type().to_string())
            .or_insert(built);
        Ok(Arc::clone(entry))
    }

    /// Returns the cached catalog, if built
    pub fn get(&self, record_type: &str) -> Option<Arc<IndexCatalog>> {
        self.catalogs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(record_type)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.catalogs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
