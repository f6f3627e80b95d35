//! Indexed execution
//!
//! Issues the plan's lookups concurrently (bounded), re-checks every fetched
//! record against the groups its lookup serves and deduplicates through the
//! shared key set. Output keeps lookup order, then store order within each
//! lookup, so a single-lookup plan preserves index order.

use futures_util::stream::{self, StreamExt, TryStreamExt};

use super::cancel::CancelToken;
use super::errors::{ExecutorError, ExecutorResult};
use super::filters::ConditionFilter;
use super::keyset::KeySet;
use super::result::KeyedRecord;
use crate::catalog::IndexCatalog;
use crate::planner::{IndexAccess, IndexedLookup};
use crate::store::{KeyRange, PrimaryKey, RangeBound, Record, RecordStore, RecordStream};

/// Records produced by the indexed lookups of one query
#[derive(Debug, Default)]
pub struct IndexedOutput {
    pub records: Vec<KeyedRecord>,
    pub scanned: usize,
    pub lookups: usize,
}

/// Runs indexed lookups against a store
pub struct IndexedExecutor<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    catalog: &'a IndexCatalog,
    max_concurrent: usize,
}

impl<'a, S: RecordStore + ?Sized> IndexedExecutor<'a, S> {
    pub fn new(store: &'a S, catalog: &'a IndexCatalog, max_concurrent: usize) -> Self {
        Self {
            store,
            catalog,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Runs every lookup; the first failure aborts the rest
    pub async fn run(
        &self,
        lookups: &[&IndexedLookup],
        keys: &KeySet,
        cancel: &CancelToken,
    ) -> ExecutorResult<IndexedOutput> {
        let outputs: Vec<(Vec<KeyedRecord>, usize)> = stream::iter(lookups)
            .map(|lookup| self.run_lookup(lookup, keys, cancel))
            .buffered(self.max_concurrent)
            .try_collect()
            .await?;

        let mut output = IndexedOutput {
            lookups: lookups.len(),
            ..IndexedOutput::default()
        };
        for (records, scanned) in outputs {
            output.records.extend(records);
            output.scanned += scanned;
        }
        Ok(output)
    }

    async fn run_lookup(
        &self,
        lookup: &IndexedLookup,
        keys: &KeySet,
        cancel: &CancelToken,
    ) -> ExecutorResult<(Vec<KeyedRecord>, usize)> {
        let mut records = Vec::new();
        let mut scanned = 0;

        for mut stream in self.open(&lookup.access) {
            while let Some(record) = next_record(&mut stream, cancel).await? {
                scanned += 1;
                if !ConditionFilter::matches_any(&record, &lookup.groups) {
                    continue;
                }
                let key = primary_key(self.catalog, &record)?;
                if keys.insert(key.clone()) {
                    records.push(KeyedRecord::new(key, record));
                }
            }
        }

        Ok((records, scanned))
    }

    /// Store calls for one access, in the order their results are consumed
    fn open(&self, access: &IndexAccess) -> Vec<RecordStream<'a>> {
        let store = self.store;
        match access {
            IndexAccess::Equal { field, value } => vec![store.lookup_equal(field, value)],
            IndexAccess::In { field, values } => vec![store.lookup_in(field, values)],
            IndexAccess::Prefix { field, prefixes } => vec![store.lookup_prefix(field, prefixes)],
            IndexAccess::Range { field, range } => vec![store.lookup_range(field, range)],
            IndexAccess::NotEqual { field, value } => {
                let below = KeyRange::new(None, Some(RangeBound::exclusive(value.clone())));
                let above = KeyRange::new(Some(RangeBound::exclusive(value.clone())), None);
                vec![
                    store.lookup_range(field, &below),
                    store.lookup_range(field, &above),
                ]
            }
            IndexAccess::CompoundEqual { fields, values } => {
                vec![store.lookup_compound_equal(fields, values)]
            }
            IndexAccess::PrimaryKeys { keys } => vec![store.fetch_by_primary_keys(keys)],
        }
    }
}

/// Pulls the next record, racing the pull against cancellation
pub(crate) async fn next_record(
    stream: &mut RecordStream<'_>,
    cancel: &CancelToken,
) -> ExecutorResult<Option<Record>> {
    cancel
        .guard(async { stream.try_next().await.map_err(ExecutorError::from) })
        .await
}

/// Primary key of a fetched record
pub(crate) fn primary_key(catalog: &IndexCatalog, record: &Record) -> ExecutorResult<PrimaryKey> {
    catalog
        .primary_key_of(record)
        .ok_or_else(|| ExecutorError::MissingPrimaryKey {
            field: catalog
                .missing_key_field(record)
                .unwrap_or_default()
                .to_string(),
        })
}
