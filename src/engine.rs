//! Query engine facade
//!
//! Binds a record store, its index catalog, configuration, logging and
//! metrics, and runs queries through compile -> plan -> execute.

use std::sync::Arc;

use crate::catalog::IndexCatalog;
use crate::compiler::{CompiledFilter, PredicateCompiler};
use crate::condition::QueryAddition;
use crate::config::EngineConfig;
use crate::error::{QueryError, QueryResult};
use crate::executor::{CancelToken, CursorMode, ExecutionResult, ExecutorError, QueryExecutor};
use crate::observability::{Event, Logger, MetricsRegistry, ObservationScope, Severity};
use crate::planner::{ExplainPlan, PlanDiagnostic, QueryPlan, QueryPlanner};
use crate::query::Query;
use crate::store::{Record, RecordStore};

/// Runs queries against one record type
pub struct QueryEngine<S: RecordStore> {
    store: S,
    catalog: Arc<IndexCatalog>,
    config: EngineConfig,
    compiler: PredicateCompiler,
    logger: Logger,
    metrics: Arc<MetricsRegistry>,
}

impl<S: RecordStore> QueryEngine<S> {
    /// Creates an engine with the default configuration
    pub fn new(store: S, catalog: Arc<IndexCatalog>) -> Self {
        let config = EngineConfig::default();
        Self {
            store,
            catalog,
            compiler: PredicateCompiler::new(config.max_dnf_groups),
            logger: Logger::new(config.log_level),
            metrics: Arc::new(MetricsRegistry::new()),
            config,
        }
    }

    /// Creates an engine with a validated configuration
    pub fn with_config(
        store: S,
        catalog: Arc<IndexCatalog>,
        config: EngineConfig,
    ) -> QueryResult<Self> {
        config.validate()?;
        let logger = Logger::new(config.log_level);
        let engine = Self {
            compiler: PredicateCompiler::new(config.max_dnf_groups),
            logger,
            config,
            ..Self::new(store, catalog)
        };
        engine.log_config();
        Ok(engine)
    }

    /// Replaces the logger (e.g. with a capturing one)
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Shares a metrics registry with other engines
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<IndexCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Compiles the query's filters into DNF
    pub fn compile(&self, query: &Query) -> QueryResult<CompiledFilter> {
        let filters = query.filters().len().to_string();
        self.logger
            .event(Event::CompileBegin, &[("filters", filters.as_str())]);

        match query.compile(&self.compiler) {
            Ok(filter) => {
                self.metrics.increment_compiled();
                let groups = filter.groups().len().to_string();
                self.logger.event(
                    Event::CompileComplete,
                    &[
                        ("groups", groups.as_str()),
                        ("universal_false", bool_str(filter.is_universal_false())),
                        ("universal_true", bool_str(filter.is_universal_true())),
                    ],
                );
                Ok(filter)
            }
            Err(err) => {
                self.metrics.increment_compile_rejected();
                self.logger.event(
                    Event::CompileRejected,
                    &[("code", err.code()), ("reason", err.to_string().as_str())],
                );
                Err(err.into())
            }
        }
    }

    /// Partitions a compiled filter into indexed lookups and cursor groups
    pub fn plan(&self, filter: &CompiledFilter, additions: &[QueryAddition]) -> QueryResult<QueryPlan> {
        let planner = QueryPlanner::new(&self.catalog).with_cursor_fallback(self.config.cursor_fallback);

        let plan = match planner.plan(filter, additions) {
            Ok(plan) => plan,
            Err(err) => {
                self.metrics.increment_plan_rejected();
                self.logger.event(
                    Event::PlanRejected,
                    &[("code", err.code()), ("reason", err.to_string().as_str())],
                );
                return Err(err.into());
            }
        };

        self.metrics.increment_planned();
        if let Some(reason) = &plan.forced {
            self.metrics.increment_forced_cursor();
            self.logger
                .event(Event::PlanForcedCursor, &[("reason", reason.to_string().as_str())]);
        }
        for diagnostic in &plan.diagnostics {
            let PlanDiagnostic::AmbiguousCompoundIndex { index, .. } = diagnostic;
            self.logger.event(
                Event::AmbiguousCompoundIndex,
                &[("index", index.as_str()), ("detail", diagnostic.to_string().as_str())],
            );
        }

        let lookups = plan.lookup_count().to_string();
        let cursor_groups = plan.cursor_required.len().to_string();
        self.logger.event(
            Event::PlanComplete,
            &[
                ("cursor_groups", cursor_groups.as_str()),
                ("lookups", lookups.as_str()),
                ("native_ordering", bool_str(plan.native_ordering)),
                ("record_type", self.catalog.record_type()),
            ],
        );
        Ok(plan)
    }

    /// Executes a plan. Cancellation or a storage failure aborts the query.
    pub async fn execute(&self, plan: &QueryPlan, cancel: &CancelToken) -> QueryResult<ExecutionResult> {
        let scope = ObservationScope::with_fields(
            &self.logger,
            "EXECUTE",
            &[("record_type", self.catalog.record_type())],
        );

        let executor = QueryExecutor::new(&self.store, self.catalog.as_ref())
            .with_options(self.config.executor_options());

        match executor.execute(plan, cancel).await {
            Ok(result) => {
                self.record_success(&result);
                let returned = result.returned_count.to_string();
                let scanned = result.scanned_count.to_string();
                scope.complete_with_fields(&[
                    ("returned", returned.as_str()),
                    ("scanned", scanned.as_str()),
                ]);
                Ok(result)
            }
            Err(err) => {
                let reason = err.to_string();
                if err == ExecutorError::Cancelled {
                    self.metrics.increment_cancelled();
                    self.logger.event(Event::QueryCancelled, &[]);
                    scope.fail(Severity::Warn, err.code(), reason.as_str());
                } else {
                    self.metrics.increment_failed();
                    self.logger
                        .event(Event::QueryFailed, &[("code", err.code()), ("reason", reason.as_str())]);
                    scope.fail(Severity::Error, err.code(), reason.as_str());
                }
                Err(err.into())
            }
        }
    }

    /// Compiles, plans and executes a query, returning its records
    pub async fn run(&self, query: &Query) -> QueryResult<Vec<Record>> {
        let result = self.run_with_cancel(query, &CancelToken::new()).await?;
        Ok(result.records)
    }

    /// Like `run`, cancellable through `cancel`, with execution statistics
    pub async fn run_with_cancel(
        &self,
        query: &Query,
        cancel: &CancelToken,
    ) -> QueryResult<ExecutionResult> {
        self.logger.event(Event::QueryBegin, &[]);
        let filter = self.compile(query)?;
        let plan = self.plan(&filter, query.additions())?;
        let result = self.execute(&plan, cancel).await?;
        let returned = result.returned_count.to_string();
        self.logger
            .event(Event::QueryComplete, &[("returned", returned.as_str())]);
        Ok(result)
    }

    /// Describes how a query would run without touching the store
    pub fn explain(&self, query: &Query) -> ExplainPlan {
        let explain = match self.compile(query) {
            Ok(filter) => match self.plan(&filter, query.additions()) {
                Ok(plan) => ExplainPlan::from_plan(&plan),
                Err(QueryError::Plan(err)) => ExplainPlan::from_error(&err),
                Err(err) => ExplainPlan::rejected(err.code(), err.to_string()),
            },
            Err(err) => ExplainPlan::rejected(err.code(), err.to_string()),
        };
        self.logger
            .event(Event::ExplainComplete, &[("accepted", bool_str(explain.accepted))]);
        explain
    }

    fn record_success(&self, result: &ExecutionResult) {
        self.metrics.increment_executed();
        self.metrics.add_indexed_lookups(result.lookups_issued as u64);
        self.metrics.add_records_scanned(result.scanned_count as u64);
        self.metrics.add_records_returned(result.returned_count as u64);

        if result.lookups_issued > 0 {
            let lookups = result.lookups_issued.to_string();
            self.logger
                .event(Event::IndexedLookups, &[("lookups", lookups.as_str())]);
        }
        if let Some(mode) = result.cursor_mode {
            self.metrics.increment_cursor_scans();
            let mode = match mode {
                CursorMode::Direct => "direct",
                CursorMode::Metadata => "metadata",
            };
            self.logger
                .event(Event::CursorScanComplete, &[("mode", mode)]);
        }
    }

    fn log_config(&self) {
        let lookups = self.config.max_concurrent_lookups.to_string();
        let batch = self.config.fetch_batch_size.to_string();
        self.logger.event(
            Event::ConfigLoaded,
            &[
                ("cursor_fallback", bool_str(self.config.cursor_fallback)),
                ("fetch_batch_size", batch.as_str()),
                ("max_concurrent_lookups", lookups.as_str()),
            ],
        );
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Expr;
    use crate::observability::LogLevel;
    use crate::store::MemoryStore;
    use serde_json::{json, Value};

    fn engine() -> QueryEngine<MemoryStore> {
        let catalog = Arc::new(
            IndexCatalog::new("person", ["id"])
                .with_index("age")
                .with_compound(["city", "zip"]),
        );
        let people = (1..=6).map(|i| {
            json!({"id": i, "age": 20 + i * 5, "city": "oslo", "zip": format!("0{}", i % 2), "name": format!("p{}", i)})
        });
        let store = MemoryStore::with_records(Arc::clone(&catalog), people).unwrap();
        QueryEngine::new(store, catalog)
    }

    fn ids(records: &[Record]) -> Vec<i64> {
        records
            .iter()
            .map(|r| r.get("id").and_then(Value::as_i64).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_run_and_metrics() {
        let engine = engine();
        let query = Query::new()
            .filter(Expr::gt("age", json!(30)))
            .order_by_descending("age")
            .take(2);
        let records = engine.run(&query).await.unwrap();
        assert_eq!(ids(&records), vec![6, 5]);

        let snapshot = engine.metrics().snapshot();
        assert_eq!(snapshot.queries_compiled, 1);
        assert_eq!(snapshot.queries_planned, 1);
        assert_eq!(snapshot.queries_executed, 1);
        assert_eq!(snapshot.indexed_lookups, 1);
        assert_eq!(snapshot.records_returned, 2);
    }

    #[tokio::test]
    async fn test_logging_follows_lifecycle() {
        let (logger, buffer) = Logger::capturing(LogLevel::Info);
        let engine = engine().with_logger(logger);
        let query = Query::new()
            .filter(Expr::eq("city", json!("oslo")) & Expr::eq("age", json!(25)))
            .order_by("name");
        engine.run(&query).await.unwrap();

        let events = buffer.events();
        assert_eq!(
            events,
            vec![
                "QUERY_BEGIN",
                "COMPILE_COMPLETE",
                "PLAN_FORCED_CURSOR",
                "AMBIGUOUS_COMPOUND_INDEX",
                "PLAN_COMPLETE",
                "EXECUTE_COMPLETE",
                "QUERY_COMPLETE",
            ]
        );
        assert_eq!(engine.metrics().snapshot().plans_forced_cursor, 1);
    }

    #[tokio::test]
    async fn test_compile_rejection_is_counted() {
        let engine = engine();
        let bad = Query::new().filter(Expr::compare(
            crate::compiler::Operand::field("age"),
            crate::condition::Comparison::GreaterThan,
            crate::compiler::Operand::field("id"),
        ));
        let err = engine.run(&bad).await.unwrap_err();
        assert_eq!(err.code(), "AERO_QUERY_UNSUPPORTED_OPERATION");
        assert_eq!(engine.metrics().snapshot().compile_rejected, 1);
        assert_eq!(engine.store().call_count(), 0);
    }

    #[tokio::test]
    async fn test_cursor_fallback_disabled() {
        let engine = engine();
        let config = EngineConfig::default().with_cursor_fallback(false);
        let store = MemoryStore::new(Arc::clone(engine.catalog()));
        let strict = QueryEngine::with_config(store, Arc::clone(engine.catalog()), config).unwrap();
        let err = strict
            .run(&Query::new().order_by("name"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "AERO_QUERY_INDEX_NOT_FOUND");
        assert_eq!(strict.metrics().snapshot().plan_rejected, 1);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let engine = engine();
        engine.store().fail_with("disk gone");
        let err = engine.run(&Query::new()).await.unwrap_err();
        assert_eq!(err.code(), "AERO_EXECUTION_STORAGE");
        assert!(err.to_string().contains("disk gone"));
        assert_eq!(engine.metrics().snapshot().queries_failed, 1);
    }

    #[tokio::test]
    async fn test_cancelled_query() {
        let engine = engine();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = engine
            .run_with_cancel(&Query::new(), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(engine.metrics().snapshot().queries_cancelled, 1);
    }

    #[test]
    fn test_explain() {
        let engine = engine();
        let explain = engine.explain(&Query::new().filter(Expr::gt("age", json!(30))).take(1));
        assert!(explain.accepted);
        assert!(explain.to_string().contains("INDEX_RANGE"));

        let rejected = engine.explain(&Query::new().filter(Expr::call(
            crate::compiler::Operand::field("name"),
            "matches",
            vec![crate::compiler::Operand::literal(json!("p.*"))],
        )));
        assert!(!rejected.accepted);
        assert_eq!(
            rejected.rejection_code.as_deref(),
            Some("AERO_QUERY_UNSUPPORTED_OPERATION")
        );
        assert_eq!(engine.store().call_count(), 0);
    }

    #[test]
    fn test_explain_reports_plan_rejection() {
        let base = engine();
        let store = MemoryStore::new(Arc::clone(base.catalog()));
        let config = EngineConfig::default().with_cursor_fallback(false);
        let strict = QueryEngine::with_config(store, Arc::clone(base.catalog()), config).unwrap();

        let explain = strict.explain(&Query::new().order_by("name"));
        assert!(!explain.accepted);
        assert_eq!(explain.rejection_code.as_deref(), Some("AERO_QUERY_INDEX_NOT_FOUND"));
        assert!(explain.to_string().contains("Status: REJECTED"));
        assert_eq!(strict.metrics().snapshot().plan_rejected, 1);
    }
}
