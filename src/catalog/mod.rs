//! Index catalog
//!
//! Describes, per record type, the only fast-access paths the store offers:
//! the primary key (single or compound), unique single-field indexes, plain
//! single-field indexes and compound indexes.
//!
//! Catalogs are built once from schema metadata (`SchemaSource`), cached in a
//! `CatalogRegistry` and passed explicitly to the planner and executor.

#[allow(clippy::module_inception)]
mod catalog;
mod errors;
mod registry;

pub use catalog::{CompoundIndex, IndexCatalog, SchemaSource};
pub use errors::{CatalogError, CatalogResult};
pub use registry::CatalogRegistry;
