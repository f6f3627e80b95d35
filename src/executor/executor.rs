//! Query executor
//!
//! Runs a `QueryPlan` against a `RecordStore`:
//!
//! 1. Universal-false plans return immediately without touching the store
//! 2. Indexed lookups run concurrently, deduplicated by primary key
//! 3. The cursor pass covers the remaining groups, skipping seen keys
//! 4. Results are ordered and windowed
//!
//! When the cursor is the only source and the query orders or paginates, the
//! cursor pass windows key metadata before fetching records.

use super::cancel::CancelToken;
use super::cursor::CursorExecutor;
use super::errors::ExecutorResult;
use super::indexed::IndexedExecutor;
use super::keyset::KeySet;
use super::result::{CursorMode, ExecutionResult, KeyedRecord};
use super::window::ResultWindower;
use crate::catalog::IndexCatalog;
use crate::condition::{has_ordering, has_pagination};
use crate::planner::{IndexedLookup, QueryPlan};
use crate::store::{Record, RecordStore};

/// Default bound on concurrently running indexed lookups
pub const DEFAULT_MAX_CONCURRENT_LOOKUPS: usize = 5;

/// Default number of keys per `fetch_by_primary_keys` call
pub const DEFAULT_FETCH_BATCH_SIZE: usize = 256;

/// Executor tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorOptions {
    pub max_concurrent_lookups: usize,
    pub fetch_batch_size: usize,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: DEFAULT_MAX_CONCURRENT_LOOKUPS,
            fetch_batch_size: DEFAULT_FETCH_BATCH_SIZE,
        }
    }
}

/// Executes query plans against a store
pub struct QueryExecutor<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    catalog: &'a IndexCatalog,
    options: ExecutorOptions,
}

impl<'a, S: RecordStore + ?Sized> QueryExecutor<'a, S> {
    /// Creates a new executor
    pub fn new(store: &'a S, catalog: &'a IndexCatalog) -> Self {
        Self {
            store,
            catalog,
            options: ExecutorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes a plan.
    ///
    /// Any storage failure or cancellation aborts the whole query; no
    /// partial result is returned.
    pub async fn execute(
        &self,
        plan: &QueryPlan,
        cancel: &CancelToken,
    ) -> ExecutorResult<ExecutionResult> {
        if plan.is_universal_false || plan.is_empty() {
            return Ok(ExecutionResult::empty());
        }
        cancel.check()?;

        let keys = KeySet::new();
        let mut result = ExecutionResult::empty();
        let mut candidates: Vec<KeyedRecord> = Vec::new();

        let lookups: Vec<&IndexedLookup> = plan.lookups().collect();
        if !lookups.is_empty() {
            let indexed = IndexedExecutor::new(
                self.store,
                self.catalog,
                self.options.max_concurrent_lookups,
            );
            let output = indexed.run(&lookups, &keys, cancel).await?;
            result.scanned_count += output.scanned;
            result.lookups_issued = output.lookups;
            candidates = output.records;
        }

        if plan.has_cursor() {
            let cursor =
                CursorExecutor::new(self.store, self.catalog, self.options.fetch_batch_size);
            let windowed = plan.is_cursor_only()
                && (has_ordering(&plan.additions) || has_pagination(&plan.additions));

            if windowed {
                let output = cursor
                    .run_windowed(&plan.cursor_required, &plan.additions, &keys, cancel)
                    .await?;
                result.scanned_count += output.scanned;
                result.cursor_mode = Some(CursorMode::Metadata);
                return Ok(finish(result, output.records));
            }

            let output = cursor.run_direct(&plan.cursor_required, &keys, cancel).await?;
            result.scanned_count += output.scanned;
            result.cursor_mode = Some(CursorMode::Direct);
            candidates.extend(output.records);
        }

        let ordered = ResultWindower::apply(candidates, &plan.additions, plan.native_ordering);
        Ok(finish(result, ordered))
    }
}

fn finish(mut result: ExecutionResult, records: Vec<KeyedRecord>) -> ExecutionResult {
    result.records = records.into_iter().map(|r| r.record).collect();
    result.returned_count = result.records.len();
    result
}

/// Executes `plan` with default options and no cancellation
pub async fn execute<S: RecordStore + ?Sized>(
    plan: &QueryPlan,
    store: &S,
    catalog: &IndexCatalog,
) -> ExecutorResult<Vec<Record>> {
    let result = QueryExecutor::new(store, catalog)
        .execute(plan, &CancelToken::new())
        .await?;
    Ok(result.records)
}
