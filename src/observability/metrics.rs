//! Query metrics registry
//!
//! - Counters only, monotonic
//! - Thread-safe and lock-free (`AtomicU64`, relaxed ordering)

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of one engine
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    queries_compiled: AtomicU64,
    compile_rejected: AtomicU64,
    queries_planned: AtomicU64,
    plan_rejected: AtomicU64,
    plans_forced_cursor: AtomicU64,
    queries_executed: AtomicU64,
    queries_failed: AtomicU64,
    queries_cancelled: AtomicU64,
    indexed_lookups: AtomicU64,
    cursor_scans: AtomicU64,
    records_scanned: AtomicU64,
    records_returned: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Compilation

    pub fn increment_compiled(&self) {
        self.queries_compiled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_compile_rejected(&self) {
        self.compile_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Planning

    pub fn increment_planned(&self) {
        self.queries_planned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_plan_rejected(&self) {
        self.plan_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_forced_cursor(&self) {
        self.plans_forced_cursor.fetch_add(1, Ordering::Relaxed);
    }

    // Execution

    pub fn increment_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cancelled(&self) {
        self.queries_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_indexed_lookups(&self, count: u64) {
        self.indexed_lookups.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_cursor_scans(&self) {
        self.cursor_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_records_scanned(&self, count: u64) {
        self.records_scanned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_records_returned(&self, count: u64) {
        self.records_returned.fetch_add(count, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            queries_compiled: load(&self.queries_compiled),
            compile_rejected: load(&self.compile_rejected),
            queries_planned: load(&self.queries_planned),
            plan_rejected: load(&self.plan_rejected),
            plans_forced_cursor: load(&self.plans_forced_cursor),
            queries_executed: load(&self.queries_executed),
            queries_failed: load(&self.queries_failed),
            queries_cancelled: load(&self.queries_cancelled),
            indexed_lookups: load(&self.indexed_lookups),
            cursor_scans: load(&self.cursor_scans),
            records_scanned: load(&self.records_scanned),
            records_returned: load(&self.records_returned),
        }
    }

    /// Current values as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_compiled: u64,
    pub compile_rejected: u64,
    pub queries_planned: u64,
    pub plan_rejected: u64,
    pub plans_forced_cursor: u64,
    pub queries_executed: u64,
    pub queries_failed: u64,
    pub queries_cancelled: u64,
    pub indexed_lookups: u64,
    pub cursor_scans: u64,
    pub records_scanned: u64,
    pub records_returned: u64,
}
