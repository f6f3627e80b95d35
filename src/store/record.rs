//! Records as seen by the query core

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored record: a JSON object addressed by field name or dotted path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    body: Value,
}

impl Record {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// Returns the record body
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    /// Reads a field by name or dotted path (`address.city`).
    ///
    /// A top-level field whose name contains dots wins over path traversal.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.body.get(path) {
            return Some(value);
        }
        if !path.contains('.') {
            return None;
        }
        path.split('.')
            .try_fold(&self.body, |current, segment| current.get(segment))
    }
}

impl From<Value> for Record {
    fn from(body: Value) -> Self {
        Self::new(body)
    }
}
