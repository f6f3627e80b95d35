//! AND-groups and the two-level OR root

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::FilterCondition;

/// Conjunction of field conditions.
///
/// Conditions are kept in canonical order without duplicates, so two groups
/// built from the same conditions in any order compare equal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AndGroup {
    conditions: Vec<FilterCondition>,
}

impl AndGroup {
    /// Creates a canonical group from conditions in any order
    pub fn new(mut conditions: Vec<FilterCondition>) -> Self {
        conditions.sort_by(|a, b| a.canonical_cmp(b));
        conditions.dedup_by(|a, b| a.is_equivalent(b));
        Self { conditions }
    }

    /// The empty group (always true)
    pub fn always() -> Self {
        Self::default()
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Distinct field names referenced by the group
    pub fn fields(&self) -> BTreeSet<&str> {
        self.conditions.iter().map(|c| c.property.as_str()).collect()
    }

    /// Conditions on one field
    pub fn conditions_on<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FilterCondition> {
        self.conditions.iter().filter(move |c| c.property == field)
    }

    /// Returns true if every condition of `self` also appears in `other`
    pub fn is_subset_of(&self, other: &AndGroup) -> bool {
        self.conditions
            .iter()
            .all(|c| other.conditions.iter().any(|o| o.is_equivalent(c)))
    }

    /// Returns a new group with `condition` added
    pub fn with(&self, condition: FilterCondition) -> Self {
        let mut conditions = self.conditions.clone();
        conditions.push(condition);
        Self::new(conditions)
    }

    /// Canonical ordering between groups: shorter first, then condition-wise
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.conditions.len().cmp(&other.conditions.len()).then_with(|| {
            self.conditions
                .iter()
                .zip(&other.conditions)
                .map(|(a, b)| a.canonical_cmp(b))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        })
    }

    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.canonical_cmp(other) == Ordering::Equal
    }
}

impl fmt::Display for AndGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return f.write_str("true");
        }
        let parts: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(" && "))
    }
}

/// Disjunction of AND-groups: the DNF root.
///
/// Always two levels deep. An empty list matches nothing; a list holding the
/// empty group matches everything.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrGroup {
    groups: Vec<AndGroup>,
}

impl OrGroup {
    /// Creates a canonical OR-list (groups sorted, exact duplicates removed)
    pub fn new(mut groups: Vec<AndGroup>) -> Self {
        groups.sort_by(|a, b| a.canonical_cmp(b));
        groups.dedup_by(|a, b| a.is_equivalent(b));
        Self { groups }
    }

    /// The OR-list matching nothing
    pub fn never() -> Self {
        Self::default()
    }

    /// The OR-list matching everything
    pub fn always() -> Self {
        Self {
            groups: vec![AndGroup::always()],
        }
    }

    pub fn groups(&self) -> &[AndGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<AndGroup> {
        self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns true if some group has no conditions
    pub fn is_always(&self) -> bool {
        self.groups.iter().any(AndGroup::is_empty)
    }

    /// Order-independent structural equality
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.groups.len() == other.groups.len()
            && self
                .groups
                .iter()
                .all(|g| other.groups.iter().any(|o| o.is_equivalent(g)))
    }
}

impl fmt::Display for OrGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            return f.write_str("false");
        }
        let parts: Vec<String> = self.groups.iter().map(|g| format!("({})", g)).collect();
        write!(f, "{}", parts.join(" || "))
    }
}
