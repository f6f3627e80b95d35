//! Cursor execution
//!
//! One primary-key ordered pass over the whole record type, evaluating the
//! cursor AND-groups in memory. Records another source already produced are
//! skipped through the shared key set.
//!
//! Two modes:
//!
//! - Direct: matching records are kept whole and windowed later.
//! - Metadata: only the primary key, the ordering values and a scan sequence
//!   number are kept. The entries are windowed first and the survivors are
//!   fetched by key in batches.

use std::collections::{BTreeMap, HashMap};

use super::cancel::CancelToken;
use super::errors::ExecutorResult;
use super::filters::ConditionFilter;
use super::indexed::{next_record, primary_key};
use super::keyset::KeySet;
use super::result::{CursorEntry, KeyedRecord};
use super::window::ResultWindower;
use crate::catalog::IndexCatalog;
use crate::condition::{ordering_fields, AndGroup, QueryAddition};
use crate::store::{PrimaryKey, RecordStore};

/// Records produced by the cursor pass
#[derive(Debug, Default)]
pub struct CursorOutput {
    pub records: Vec<KeyedRecord>,
    pub scanned: usize,
}

/// Runs the cursor pass against a store
pub struct CursorExecutor<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    catalog: &'a IndexCatalog,
    fetch_batch_size: usize,
}

impl<'a, S: RecordStore + ?Sized> CursorExecutor<'a, S> {
    pub fn new(store: &'a S, catalog: &'a IndexCatalog, fetch_batch_size: usize) -> Self {
        Self {
            store,
            catalog,
            fetch_batch_size: fetch_batch_size.max(1),
        }
    }

    /// Direct mode: keeps every matching record not seen before
    pub async fn run_direct(
        &self,
        groups: &[AndGroup],
        keys: &KeySet,
        cancel: &CancelToken,
    ) -> ExecutorResult<CursorOutput> {
        let mut output = CursorOutput::default();
        let mut stream = self.store.scan_all_ordered_by_primary_key();

        while let Some(record) = next_record(&mut stream, cancel).await? {
            output.scanned += 1;
            if !ConditionFilter::matches_any(&record, groups) {
                continue;
            }
            let key = primary_key(self.catalog, &record)?;
            if keys.insert(key.clone()) {
                output.records.push(KeyedRecord::new(key, record));
            }
        }

        Ok(output)
    }

    /// Metadata mode: windows key entries, then fetches the survivors.
    ///
    /// The returned records are already in final order.
    pub async fn run_windowed(
        &self,
        groups: &[AndGroup],
        additions: &[QueryAddition],
        keys: &KeySet,
        cancel: &CancelToken,
    ) -> ExecutorResult<CursorOutput> {
        let fields = ordering_fields(additions);
        let mut entries = Vec::new();
        let mut scanned = 0;
        let mut stream = self.store.scan_all_ordered_by_primary_key();

        while let Some(record) = next_record(&mut stream, cancel).await? {
            scanned += 1;
            if !ConditionFilter::matches_any(&record, groups) {
                continue;
            }
            let key = primary_key(self.catalog, &record)?;
            if !keys.insert(key.clone()) {
                continue;
            }
            let values: BTreeMap<String, _> = fields
                .iter()
                .filter_map(|f| record.get(f).map(|v| (f.to_string(), v.clone())))
                .collect();
            entries.push(CursorEntry {
                key,
                sequence: entries.len() as u64,
                values,
            });
        }
        drop(stream);

        let window: Vec<PrimaryKey> = ResultWindower::apply(entries, additions, false)
            .into_iter()
            .map(|entry| entry.key)
            .collect();
        let records = self.fetch(&window, cancel).await?;

        Ok(CursorOutput { records, scanned })
    }

    /// Fetches `keys` in batches and returns them in the order given.
    /// Keys whose record vanished since the scan are dropped.
    async fn fetch(&self, keys: &[PrimaryKey], cancel: &CancelToken) -> ExecutorResult<Vec<KeyedRecord>> {
        let mut fetched = HashMap::with_capacity(keys.len());
        for batch in keys.chunks(self.fetch_batch_size) {
            let mut stream = self.store.fetch_by_primary_keys(batch);
            while let Some(record) = next_record(&mut stream, cancel).await? {
                let key = primary_key(self.catalog, &record)?;
                fetched.insert(key, record);
            }
        }

        Ok(keys
            .iter()
            .filter_map(|key| {
                fetched
                    .remove(key)
                    .map(|record| KeyedRecord::new(key.clone(), record))
            })
            .collect())
    }
}
