//! Shared primary-key set used to deduplicate results across lookups

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::store::PrimaryKey;

/// Mutex-guarded set of primary keys already produced by the query.
///
/// This is the only mutable state shared between concurrent lookups.
#[derive(Debug, Default)]
pub struct KeySet {
    seen: Mutex<HashSet<PrimaryKey>>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key`; returns false if it was already present
    pub fn insert(&self, key: PrimaryKey) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &PrimaryKey) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
