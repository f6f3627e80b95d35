//! Record store contract
//!
//! The store is an external collaborator. The query core consumes it only
//! through `RecordStore`: index lookups, one primary-key ordered scan, and
//! batched fetch by primary key. Every call returns a lazy, single-pass
//! record stream.
//!
//! `MemoryStore` is a BTreeMap-backed reference implementation.

mod errors;
mod key;
mod memory;
mod record;

use futures_util::stream::BoxStream;
use serde_json::Value;

pub use errors::{StoreError, StoreResult};
pub use key::{IndexKey, PrimaryKey};
pub use memory::MemoryStore;
pub use record::Record;

/// Lazy, finite, single-pass sequence of records
pub type RecordStream<'a> = BoxStream<'a, StoreResult<Record>>;

/// One end of a range lookup
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBound {
    pub value: Value,
    pub inclusive: bool,
}

impl RangeBound {
    pub fn inclusive(value: Value) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    pub fn exclusive(value: Value) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }
}

/// Range over one index. A missing bound is open-ended.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyRange {
    pub lower: Option<RangeBound>,
    pub upper: Option<RangeBound>,
}

impl KeyRange {
    pub fn new(lower: Option<RangeBound>, upper: Option<RangeBound>) -> Self {
        Self { lower, upper }
    }

    pub fn is_bounded(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }
}

/// Storage collaborator consumed by the executors.
///
/// Lookups on a field the store does not index yield a
/// `StoreError::NotIndexed` item. The primary-key field (single-field keys)
/// is always addressable through the single-field lookups.
pub trait RecordStore: Send + Sync {
    /// Records whose `field` equals `value`
    fn lookup_equal(&self, field: &str, value: &Value) -> RecordStream<'_>;

    /// Records whose `field` lies within `range`, in index order
    fn lookup_range(&self, field: &str, range: &KeyRange) -> RecordStream<'_>;

    /// Records whose `field` equals any of `values`, in index order
    fn lookup_in(&self, field: &str, values: &[Value]) -> RecordStream<'_>;

    /// Records whose string `field` starts with any of `prefixes`, in index order
    fn lookup_prefix(&self, field: &str, prefixes: &[String]) -> RecordStream<'_>;

    /// Records matching a compound index on `fields` with `values` (same order)
    fn lookup_compound_equal(&self, fields: &[String], values: &[Value]) -> RecordStream<'_>;

    /// Every record, ordered by primary key
    fn scan_all_ordered_by_primary_key(&self) -> RecordStream<'_>;

    /// Records for `keys`; keys without a record are skipped
    fn fetch_by_primary_keys(&self, keys: &[PrimaryKey]) -> RecordStream<'_>;
}
