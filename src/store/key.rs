//! Totally ordered index keys and primary-key tuples
//!
//! Keys are derived from JSON scalars. Ordering is deterministic:
//! Null < Bool < Number < String. Numbers are exact `Numeric` values: integers
//! and floats share one key space and `3` and `3.0` are one key, while large
//! integers never collapse into a neighbour.

use std::fmt;

use serde_json::Value;

use crate::value::Numeric;

/// Index key representing a serialized field value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    Null,
    /// Boolean value (false < true)
    Bool(bool),
    /// Numeric value, ordered numerically
    Number(Numeric),
    /// String value
    String(String),
}

impl IndexKey {
    /// Create a key from a boolean
    pub fn from_bool(v: bool) -> Self {
        IndexKey::Bool(v)
    }

    /// Create a key from a float. `-0.0` and `0.0` are one key.
    pub fn from_f64(v: f64) -> Self {
        IndexKey::Number(Numeric::from_f64(v))
    }

    /// Create a key from a string
    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Create a key from a JSON value. Arrays and objects are not indexable.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(IndexKey::Null),
            Value::Bool(b) => Some(IndexKey::from_bool(*b)),
            Value::Number(n) => Some(IndexKey::Number(Numeric::of(n))),
            Value::String(s) => Some(IndexKey::from_string(s.as_str())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Returns true if both keys are of the same kind
    pub fn same_kind(&self, other: &IndexKey) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Returns the string payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            IndexKey::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Null => f.write_str("null"),
            IndexKey::Bool(b) => write!(f, "{}", b),
            IndexKey::Number(n) => write!(f, "{}", n),
            IndexKey::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Primary-key value: an ordered tuple matching the catalog's primary-key
/// field order. Two records are the same entity iff their tuples are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimaryKey(Vec<IndexKey>);

impl PrimaryKey {
    pub fn new(parts: Vec<IndexKey>) -> Self {
        Self(parts)
    }

    /// Builds a key from JSON values. Fails on null or non-scalar parts.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<Self> {
        values
            .into_iter()
            .map(|v| match IndexKey::from_json(v) {
                Some(IndexKey::Null) | None => None,
                key => key,
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Single-field key
    pub fn single(value: &Value) -> Option<Self> {
        Self::from_values(std::iter::once(value))
    }

    pub fn parts(&self) -> &[IndexKey] {
        &self.0
    }

    pub fn is_compound(&self) -> bool {
        self.0.len() > 1
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|k| k.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}
