//! Cooperative cancellation
//!
//! A `CancelToken` is checked between pulls from every record stream and
//! raced against each store call. Once fired it stays fired.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use super::errors::{ExecutorError, ExecutorResult};

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cloneable cancellation handle; all clones observe the same state
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the token and wakes every waiter
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `Cancelled` once the token has fired
    pub fn check(&self) -> ExecutorResult<()> {
        if self.is_cancelled() {
            Err(ExecutorError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves when the token fires
    pub async fn cancelled(&self) {
        loop {
            // Register before checking so a concurrent cancel is not missed
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Runs `work` unless the token fires first
    pub async fn guard<T, F>(&self, work: F) -> ExecutorResult<T>
    where
        F: Future<Output = ExecutorResult<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(ExecutorError::Cancelled),
            result = work => result,
        }
    }
}
