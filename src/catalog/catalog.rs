//! Per-record-type index description

use std::collections::BTreeSet;

use super::errors::{CatalogError, CatalogResult};
use crate::store::{PrimaryKey, Record};

/// Schema metadata supplied by the host's schema layer
pub trait SchemaSource {
    /// Record type name, used as the catalog cache key
    fn record_type(&self) -> &str;
    /// Primary-key fields in key order
    fn primary_key(&self) -> Vec<String>;
    /// Fields carrying a unique single-field index
    fn unique_indexes(&self) -> Vec<String>;
    /// Fields carrying a plain single-field index
    fn single_indexes(&self) -> Vec<String>;
    /// Compound indexes, each an ordered field tuple
    fn compound_indexes(&self) -> Vec<Vec<String>>;
}

/// Secondary index keyed on an ordered tuple of fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundIndex {
    fields: Vec<String>,
}

impl CompoundIndex {
    pub fn new(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Fields in index key order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns true if `fields` is exactly this index's field set
    pub fn covers_exactly(&self, fields: &BTreeSet<&str>) -> bool {
        fields.len() == self.fields.len() && self.fields.iter().all(|f| fields.contains(f.as_str()))
    }

    /// Returns true if `fields` shares at least one field with this index
    /// without matching it exactly
    pub fn overlaps_partially(&self, fields: &BTreeSet<&str>) -> bool {
        !self.covers_exactly(fields) && self.fields.iter().any(|f| fields.contains(f.as_str()))
    }

    pub fn name(&self) -> String {
        self.fields.join("+")
    }
}

/// Primary key and index declarations of one record type.
///
/// Built once from schema metadata and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCatalog {
    record_type: String,
    primary_key: Vec<String>,
    unique_indexes: BTreeSet<String>,
    single_indexes: BTreeSet<String>,
    compound_indexes: Vec<CompoundIndex>,
}

impl IndexCatalog {
    /// Creates a catalog with only a primary key
    pub fn new(
        record_type: impl Into<String>,
        primary_key: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            record_type: record_type.into(),
            primary_key: primary_key.into_iter().map(Into::into).collect(),
            unique_indexes: BTreeSet::new(),
            single_indexes: BTreeSet::new(),
            compound_indexes: Vec::new(),
        }
    }

    /// Adds a unique single-field index
    pub fn with_unique(mut self, field: impl Into<String>) -> Self {
        self.unique_indexes.insert(field.into());
        self
    }

    /// Adds a plain single-field index
    pub fn with_index(mut self, field: impl Into<String>) -> Self {
        self.single_indexes.insert(field.into());
        self
    }

    /// Adds a compound index
    pub fn with_compound(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.compound_indexes.push(CompoundIndex::new(fields));
        self
    }

    /// Builds and validates a catalog from schema metadata
    pub fn from_schema(schema: &dyn SchemaSource) -> CatalogResult<Self> {
        let mut catalog = Self::new(schema.record_type(), schema.primary_key());
        for field in schema.unique_indexes() {
            catalog = catalog.with_unique(field);
        }
        for field in schema.single_indexes() {
            catalog = catalog.with_index(field);
        }
        for fields in schema.compound_indexes() {
            catalog = catalog.with_compound(fields);
        }
        catalog.validate()?;
        Ok(catalog)
    }

    /// Checks the declaration invariants
    pub fn validate(&self) -> CatalogResult<()> {
        if self.primary_key.is_empty() {
            return Err(CatalogError::EmptyPrimaryKey(self.record_type.clone()));
        }

        let mut seen = BTreeSet::new();
        for field in &self.primary_key {
            if !seen.insert(field.as_str()) {
                return Err(CatalogError::DuplicatePrimaryKeyField {
                    record_type: self.record_type.clone(),
                    field: field.clone(),
                });
            }
        }

        for index in &self.compound_indexes {
            let distinct: BTreeSet<&str> = index.fields.iter().map(String::as_str).collect();
            if distinct.len() < 2 || distinct.len() != index.fields.len() {
                return Err(CatalogError::InvalidCompoundIndex {
                    record_type: self.record_type.clone(),
                    fields: index.fields.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// Primary-key fields in key order
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn unique_indexes(&self) -> &BTreeSet<String> {
        &self.unique_indexes
    }

    pub fn single_indexes(&self) -> &BTreeSet<String> {
        &self.single_indexes
    }

    pub fn compound_indexes(&self) -> &[CompoundIndex] {
        &self.compound_indexes
    }

    pub fn has_compound_primary_key(&self) -> bool {
        self.primary_key.len() > 1
    }

    /// Returns true if `field` is the whole (single-field) primary key
    pub fn is_primary_key_field(&self, field: &str) -> bool {
        self.primary_key.len() == 1 && self.primary_key[0] == field
    }

    pub fn is_unique(&self, field: &str) -> bool {
        self.is_primary_key_field(field) || self.unique_indexes.contains(field)
    }

    /// Returns true if a single-field lookup can be served for `field`
    pub fn is_indexed(&self, field: &str) -> bool {
        self.is_unique(field) || self.single_indexes.contains(field)
    }

    /// Single-field indexed fields, primary key first
    pub fn indexed_fields(&self) -> BTreeSet<&str> {
        let mut fields: BTreeSet<&str> = self
            .unique_indexes
            .iter()
            .chain(&self.single_indexes)
            .map(String::as_str)
            .collect();
        if let [pk] = self.primary_key.as_slice() {
            fields.insert(pk);
        }
        fields
    }

    /// Compound index whose fields are exactly `fields`
    pub fn compound_index_for(&self, fields: &BTreeSet<&str>) -> Option<&CompoundIndex> {
        self.compound_indexes.iter().find(|i| i.covers_exactly(fields))
    }

    /// Compound indexes partially covered by `fields`
    pub fn partially_covered(&self, fields: &BTreeSet<&str>) -> Vec<&CompoundIndex> {
        self.compound_indexes
            .iter()
            .filter(|i| i.overlaps_partially(fields))
            .collect()
    }

    /// Extracts the primary-key tuple of a record
    pub fn primary_key_of(&self, record: &Record) -> Option<PrimaryKey> {
        let values: Option<Vec<_>> = self.primary_key.iter().map(|f| record.get(f)).collect();
        PrimaryKey::from_values(values?)
    }

    /// First primary-key field a record lacks
    pub fn missing_key_field(&self, record: &Record) -> Option<&str> {
        self.primary_key
            .iter()
            .find(|f| record.get(f).map_or(true, |v| v.is_null()))
            .map(String::as_str)
    }
}
