//! Index lookup descriptors
//!
//! A lookup names one store access plus the AND-groups it serves. The access
//! only narrows candidates; every fetched record is re-checked against the
//! groups, so a lookup may safely over-fetch.

use std::fmt;

use serde_json::Value;

use crate::condition::AndGroup;
use crate::store::{KeyRange, PrimaryKey};

/// Store access issued for one lookup
#[derive(Debug, Clone, PartialEq)]
pub enum IndexAccess {
    /// Single value on a single-field index
    Equal { field: String, value: Value },
    /// Value set on a single-field index
    In { field: String, values: Vec<Value> },
    /// Prefix set on a string index
    Prefix { field: String, prefixes: Vec<String> },
    /// Range on a single-field index; either end may be open
    Range { field: String, range: KeyRange },
    /// Everything but one value, issued as two open-ended ranges
    NotEqual { field: String, value: Value },
    /// Equality on every field of a compound index
    CompoundEqual { fields: Vec<String>, values: Vec<Value> },
    /// Direct fetch by primary key
    PrimaryKeys { keys: Vec<PrimaryKey> },
}

impl IndexAccess {
    /// Single index field, if the access targets one
    pub fn field(&self) -> Option<&str> {
        match self {
            IndexAccess::Equal { field, .. }
            | IndexAccess::In { field, .. }
            | IndexAccess::Prefix { field, .. }
            | IndexAccess::Range { field, .. }
            | IndexAccess::NotEqual { field, .. } => Some(field),
            IndexAccess::CompoundEqual { .. } | IndexAccess::PrimaryKeys { .. } => None,
        }
    }

    /// Returns true if the store yields records in `field` index order
    pub fn preserves_order_of(&self, field: &str) -> bool {
        self.field() == Some(field)
    }

    /// Returns the access name for explain output
    pub fn kind_name(&self) -> &'static str {
        match self {
            IndexAccess::Equal { .. } => "INDEX_EQ",
            IndexAccess::In { .. } => "INDEX_IN",
            IndexAccess::Prefix { .. } => "INDEX_PREFIX",
            IndexAccess::Range { .. } => "INDEX_RANGE",
            IndexAccess::NotEqual { .. } => "INDEX_NOT_EQ",
            IndexAccess::CompoundEqual { .. } => "COMPOUND_EQ",
            IndexAccess::PrimaryKeys { .. } => "PK_FETCH",
        }
    }
}

impl fmt::Display for IndexAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexAccess::Equal { field, value } => write!(f, "{} == {}", field, value),
            IndexAccess::In { field, values } => {
                let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} in [{}]", field, values.join(", "))
            }
            IndexAccess::Prefix { field, prefixes } => {
                write!(f, "{} starts_with {:?}", field, prefixes)
            }
            IndexAccess::Range { field, range } => {
                match &range.lower {
                    Some(b) => write!(f, "{}{}", if b.inclusive { "[" } else { "(" }, b.value)?,
                    None => write!(f, "(-inf")?,
                }
                write!(f, " .. ")?;
                match &range.upper {
                    Some(b) => write!(f, "{}{}", b.value, if b.inclusive { "]" } else { ")" })?,
                    None => write!(f, "+inf)")?,
                }
                write!(f, " on {}", field)
            }
            IndexAccess::NotEqual { field, value } => write!(f, "{} != {}", field, value),
            IndexAccess::CompoundEqual { fields, values } => {
                let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "({}) == ({})", fields.join(", "), values.join(", "))
            }
            IndexAccess::PrimaryKeys { keys } => {
                let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
                write!(f, "primary key in [{}]", keys.join(", "))
            }
        }
    }
}

/// One store access and the AND-groups whose matches it must produce
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedLookup {
    pub access: IndexAccess,
    pub groups: Vec<AndGroup>,
}

impl IndexedLookup {
    pub fn new(access: IndexAccess, group: AndGroup) -> Self {
        Self {
            access,
            groups: vec![group],
        }
    }
}
