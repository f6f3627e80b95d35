//! In-memory record store
//!
//! Records live in a BTreeMap keyed by primary key, so a full scan is
//! naturally in primary-key order. Every single-field index declared in the
//! catalog is a BTreeMap from `IndexKey` to the set of primary keys holding
//! that key. Compound indexes key on the tuple of their fields' keys.
//!
//! Null, array and object field values are not indexed.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::stream::{self, StreamExt};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::key::{IndexKey, PrimaryKey};
use super::record::Record;
use super::{KeyRange, RangeBound, RecordStore, RecordStream};
use crate::catalog::IndexCatalog;

/// Single-field index: key -> primary keys, both sorted ascending
type IndexTree = BTreeMap<IndexKey, BTreeSet<PrimaryKey>>;

/// Compound index: key tuple (declared field order) -> primary keys
type CompoundTree = BTreeMap<Vec<IndexKey>, BTreeSet<PrimaryKey>>;

/// BTreeMap-backed `RecordStore` honoring an `IndexCatalog`
#[derive(Debug)]
pub struct MemoryStore {
    catalog: Arc<IndexCatalog>,
    records: BTreeMap<PrimaryKey, Record>,
    field_indexes: HashMap<String, IndexTree>,
    compound_indexes: Vec<(Vec<String>, CompoundTree)>,
    calls: AtomicU64,
    failure: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Creates an empty store with one index per catalog declaration
    pub fn new(catalog: Arc<IndexCatalog>) -> Self {
        let field_indexes = catalog
            .indexed_fields()
            .into_iter()
            .map(|f| (f.to_string(), IndexTree::new()))
            .collect();
        let compound_indexes = catalog
            .compound_indexes()
            .iter()
            .map(|i| (i.fields().to_vec(), CompoundTree::new()))
            .collect();

        Self {
            catalog,
            records: BTreeMap::new(),
            field_indexes,
            compound_indexes,
            calls: AtomicU64::new(0),
            failure: Mutex::new(None),
        }
    }

    /// Creates a store holding `bodies`
    pub fn with_records(
        catalog: Arc<IndexCatalog>,
        bodies: impl IntoIterator<Item = Value>,
    ) -> StoreResult<Self> {
        let mut store = Self::new(catalog);
        for body in bodies {
            store.insert(body)?;
        }
        Ok(store)
    }

    pub fn catalog(&self) -> &Arc<IndexCatalog> {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of `RecordStore` calls served so far
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every subsequent `RecordStore` call yield a backend failure
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    /// Clears an injected failure
    pub fn recover(&self) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Inserts or replaces a record.
    ///
    /// Fails if a primary-key field is missing or a unique index already
    /// holds the value for a different record. A failed insert changes
    /// nothing.
    pub fn insert(&mut self, body: Value) -> StoreResult<PrimaryKey> {
        let record = Record::new(body);
        let pk = match self.catalog.primary_key_of(&record) {
            Some(pk) => pk,
            None => {
                let field = self
                    .catalog
                    .missing_key_field(&record)
                    .unwrap_or_default()
                    .to_string();
                return Err(StoreError::MissingPrimaryKey(field));
            }
        };

        for field in self.catalog.unique_indexes() {
            let Some(key) = index_key(&record, field) else {
                continue;
            };
            let taken = self
                .field_indexes
                .get(field)
                .and_then(|tree| tree.get(&key))
                .is_some_and(|holders| holders.iter().any(|holder| *holder != pk));
            if taken {
                return Err(StoreError::UniqueViolation(field.clone()));
            }
        }

        if let Some(previous) = self.records.remove(&pk) {
            self.unindex(&pk, &previous);
        }
        self.index(&pk, &record);
        self.records.insert(pk.clone(), record);
        Ok(pk)
    }

    /// Removes a record by primary key
    pub fn remove(&mut self, pk: &PrimaryKey) -> Option<Record> {
        let record = self.records.remove(pk)?;
        self.unindex(pk, &record);
        Some(record)
    }

    fn index(&mut self, pk: &PrimaryKey, record: &Record) {
        for (field, tree) in self.field_indexes.iter_mut() {
            if let Some(key) = index_key(record, field) {
                tree.entry(key).or_default().insert(pk.clone());
            }
        }
        for (fields, tree) in self.compound_indexes.iter_mut() {
            if let Some(keys) = compound_key(record, fields) {
                tree.entry(keys).or_default().insert(pk.clone());
            }
        }
    }

    fn unindex(&mut self, pk: &PrimaryKey, record: &Record) {
        for (field, tree) in self.field_indexes.iter_mut() {
            if let Some(key) = index_key(record, field) {
                remove_holder(tree, &key, pk);
            }
        }
        for (fields, tree) in self.compound_indexes.iter_mut() {
            if let Some(keys) = compound_key(record, fields) {
                remove_holder(tree, &keys, pk);
            }
        }
    }

    /// Counts the call and checks for an injected failure
    fn begin(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.failure.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(message) => Err(StoreError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    fn tree(&self, field: &str) -> Result<&IndexTree, StoreError> {
        self.field_indexes
            .get(field)
            .ok_or_else(|| StoreError::NotIndexed(field.to_string()))
    }

    fn records_for<'k>(&self, keys: impl IntoIterator<Item = &'k PrimaryKey>) -> Vec<Record> {
        keys.into_iter()
            .filter_map(|pk| self.records.get(pk).cloned())
            .collect()
    }

    fn equal_keys(&self, field: &str, value: &Value) -> StoreResult<Vec<PrimaryKey>> {
        let tree = self.tree(field)?;
        Ok(scalar_key(value)
            .and_then(|key| tree.get(&key))
            .map(|holders| holders.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn range_keys(&self, field: &str, range: &KeyRange) -> StoreResult<Vec<PrimaryKey>> {
        let tree = self.tree(field)?;

        let resolve = |bound: &Option<RangeBound>| match bound {
            Some(bound) => bound_key(bound).map(Some),
            None => Some(None),
        };
        let (Some(lower), Some(upper)) = (resolve(&range.lower), resolve(&range.upper)) else {
            return Ok(Vec::new());
        };

        // Range lookups never cross kinds: the bound kind caps the open end
        let kind = match (&lower, &upper) {
            (Some((lo, _)), Some((hi, _))) if !lo.same_kind(hi) => return Ok(Vec::new()),
            (Some((key, _)), _) | (_, Some((key, _))) => Some(key.clone()),
            (None, None) => None,
        };

        if let (Some((lo, lo_inc)), Some((hi, hi_inc))) = (&lower, &upper) {
            if lo > hi || (lo == hi && !(*lo_inc && *hi_inc)) {
                return Ok(Vec::new());
            }
        }

        let start = to_bound(lower.as_ref());
        let end = to_bound(upper.as_ref());

        Ok(tree
            .range((start, end))
            .filter(|(key, _)| {
                kind.as_ref().map_or(**key != IndexKey::Null, |k| key.same_kind(k))
            })
            .flat_map(|(_, holders)| holders.iter().cloned())
            .collect())
    }

    fn in_keys(&self, field: &str, values: &[Value]) -> StoreResult<Vec<PrimaryKey>> {
        let tree = self.tree(field)?;
        let keys: BTreeSet<IndexKey> = values.iter().filter_map(scalar_key).collect();
        Ok(keys
            .iter()
            .filter_map(|key| tree.get(key))
            .flat_map(|holders| holders.iter().cloned())
            .collect())
    }

    fn prefix_keys(&self, field: &str, prefixes: &[String]) -> StoreResult<Vec<PrimaryKey>> {
        let tree = self.tree(field)?;

        // A prefix already covered by a shorter one would repeat records
        let sorted: BTreeSet<&str> = prefixes.iter().map(String::as_str).collect();
        let mut effective: Vec<&str> = Vec::new();
        for prefix in sorted {
            if !effective.iter().any(|p| prefix.starts_with(p)) {
                effective.push(prefix);
            }
        }

        let mut pks = Vec::new();
        for prefix in effective {
            let start = IndexKey::from_string(prefix);
            pks.extend(
                tree.range(start..)
                    .take_while(|(key, _)| key.as_str().is_some_and(|s| s.starts_with(prefix)))
                    .flat_map(|(_, holders)| holders.iter().cloned()),
            );
        }
        Ok(pks)
    }

    fn compound_keys(&self, fields: &[String], values: &[Value]) -> StoreResult<Vec<PrimaryKey>> {
        let not_indexed = || StoreError::NotIndexed(fields.join("+"));
        if fields.len() != values.len() {
            return Err(not_indexed());
        }

        let requested: BTreeMap<&str, &Value> = fields
            .iter()
            .map(String::as_str)
            .zip(values.iter())
            .collect();
        let (declared, tree) = self
            .compound_indexes
            .iter()
            .find(|(declared, _)| {
                declared.len() == requested.len()
                    && declared.iter().all(|f| requested.contains_key(f.as_str()))
            })
            .ok_or_else(not_indexed)?;

        let tuple: Option<Vec<IndexKey>> = declared
            .iter()
            .map(|f| requested.get(f.as_str()).and_then(|v| scalar_key(v)))
            .collect();

        Ok(tuple
            .and_then(|tuple| tree.get(&tuple))
            .map(|holders| holders.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn respond(
        &self,
        keys: impl FnOnce(&Self) -> StoreResult<Vec<PrimaryKey>>,
    ) -> RecordStream<'_> {
        let result = self.begin().and_then(|_| keys(self));
        match result {
            Ok(pks) => stream::iter(self.records_for(&pks).into_iter().map(Ok)).boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }
}

impl RecordStore for MemoryStore {
    fn lookup_equal(&self, field: &str, value: &Value) -> RecordStream<'_> {
        self.respond(|s| s.equal_keys(field, value))
    }

    fn lookup_range(&self, field: &str, range: &KeyRange) -> RecordStream<'_> {
        self.respond(|s| s.range_keys(field, range))
    }

    fn lookup_in(&self, field: &str, values: &[Value]) -> RecordStream<'_> {
        self.respond(|s| s.in_keys(field, values))
    }

    fn lookup_prefix(&self, field: &str, prefixes: &[String]) -> RecordStream<'_> {
        self.respond(|s| s.prefix_keys(field, prefixes))
    }

    fn lookup_compound_equal(&self, fields: &[String], values: &[Value]) -> RecordStream<'_> {
        self.respond(|s| s.compound_keys(fields, values))
    }

    fn scan_all_ordered_by_primary_key(&self) -> RecordStream<'_> {
        self.respond(|s| Ok(s.records.keys().cloned().collect()))
    }

    fn fetch_by_primary_keys(&self, keys: &[PrimaryKey]) -> RecordStream<'_> {
        self.respond(|_| Ok(keys.to_vec()))
    }
}

/// Index key of a scalar, non-null value
fn scalar_key(value: &Value) -> Option<IndexKey> {
    match IndexKey::from_json(value)? {
        IndexKey::Null => None,
        key => Some(key),
    }
}

fn index_key(record: &Record, field: &str) -> Option<IndexKey> {
    record.get(field).and_then(scalar_key)
}

fn compound_key(record: &Record, fields: &[String]) -> Option<Vec<IndexKey>> {
    fields.iter().map(|f| index_key(record, f)).collect()
}

/// Converts a bound; `None` means the bound value is not indexable
fn bound_key(bound: &RangeBound) -> Option<(IndexKey, bool)> {
    scalar_key(&bound.value).map(|key| (key, bound.inclusive))
}

fn to_bound(bound: Option<&(IndexKey, bool)>) -> Bound<IndexKey> {
    match bound {
        Some((key, true)) => Bound::Included(key.clone()),
        Some((key, false)) => Bound::Excluded(key.clone()),
        None => Bound::Unbounded,
    }
}

fn remove_holder<K: Ord>(tree: &mut BTreeMap<K, BTreeSet<PrimaryKey>>, key: &K, pk: &PrimaryKey) {
    if let Some(holders) = tree.get_mut(key) {
        holders.remove(pk);
        if holders.is_empty() {
            tree.remove(key);
        }
    }
}
