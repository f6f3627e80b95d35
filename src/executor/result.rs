//! Result types for query execution

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::Value;

use super::window::Windowable;
use crate::store::{PrimaryKey, Record};

/// A fetched record with its primary key
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRecord {
    pub key: PrimaryKey,
    pub record: Record,
}

impl KeyedRecord {
    pub fn new(key: PrimaryKey, record: Record) -> Self {
        Self { key, record }
    }
}

impl Windowable for KeyedRecord {
    fn sort_value(&self, field: &str) -> Option<&Value> {
        self.record.get(field)
    }

    fn base_cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Metadata collected by a windowed cursor pass: the primary key, the
/// ordering field values and the scan sequence number
#[derive(Debug, Clone, PartialEq)]
pub struct CursorEntry {
    pub key: PrimaryKey,
    pub sequence: u64,
    pub values: BTreeMap<String, Value>,
}

impl Windowable for CursorEntry {
    fn sort_value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    fn base_cmp(&self, other: &Self) -> Ordering {
        self.sequence.cmp(&other.sequence)
    }
}

/// How the cursor pass ran, if it ran at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    /// Full records accumulated, windowed afterwards with any indexed results
    Direct,
    /// Keys windowed first, surviving records fetched in batches
    Metadata,
}

/// Result of query execution
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// Records in result order
    pub records: Vec<Record>,
    /// Records pulled from the store, including ones rejected by filters
    pub scanned_count: usize,
    pub returned_count: usize,
    /// Indexed lookups issued (a not-equal lookup counts once)
    pub lookups_issued: usize,
    pub cursor_mode: Option<CursorMode>,
}

impl ExecutionResult {
    /// Creates an empty result
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            scanned_count: 0,
            returned_count: 0,
            lookups_issued: 0,
            cursor_mode: None,
        }
    }

    /// Returns true if no records matched
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of results
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Record bodies in result order
    pub fn bodies(&self) -> impl Iterator<Item = &Value> {
        self.records.iter().map(Record::body)
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
