//! Query partitioner
//!
//! Classifies every AND-group of a compiled filter against the index
//! catalog:
//!
//! 1. Compound: all operations indexable and equality on every field of a
//!    compound index (or of a compound primary key)
//! 2. Single: every field individually indexed and all operations indexable
//! 3. Cursor: everything else
//!
//! A single-indexed group issues one lookup on its driving condition, chosen
//! by strict priority:
//!
//! 1. Primary key equality
//! 2. Unique index equality
//! 3. Indexed equality or `In`
//! 4. Indexed range (all range conditions of the field merged)
//! 5. Indexed prefix
//! 6. Indexed not-equal
//!
//! Ties prefer the first ordering field, then the lexicographically smallest
//! field. The whole group is re-evaluated on every fetched record.
//!
//! Planning is deterministic: same inputs, same plan.

use std::fmt;

use serde_json::Value;

use super::bounds::merge_range;
use super::errors::{PlanError, PlanResult};
use super::lookup::{IndexAccess, IndexedLookup};
use crate::catalog::IndexCatalog;
use crate::compiler::CompiledFilter;
use crate::condition::{
    has_pagination, has_stable_ordering, ordering_fields, take_last_without_ordering, AndGroup,
    FilterCondition, FilterOperation, QueryAddition,
};
use crate::store::PrimaryKey;
use crate::value::value_key;

/// Why the whole query was sent to the cursor path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForceReason {
    /// Ordering on a field without a single-field index
    UnindexedOrdering { field: String },
    /// `TakeLast` with no preceding ordering
    TakeLastWithoutOrdering,
    /// Pagination over more than one independent lookup
    PaginatedMultipleLookups { lookups: usize },
}

impl fmt::Display for ForceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForceReason::UnindexedOrdering { field } => {
                write!(f, "ordering on unindexed field '{}'", field)
            }
            ForceReason::TakeLastWithoutOrdering => write!(f, "take_last without ordering"),
            ForceReason::PaginatedMultipleLookups { lookups } => {
                write!(f, "pagination over {} indexed lookups", lookups)
            }
        }
    }
}

/// Non-fatal planning observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanDiagnostic {
    /// Group fields overlap a compound index without covering it; the group
    /// fell back to single-field classification
    AmbiguousCompoundIndex { index: String, fields: Vec<String> },
}

impl fmt::Display for PlanDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanDiagnostic::AmbiguousCompoundIndex { index, fields } => write!(
                f,
                "AMBIGUOUS_COMPOUND_INDEX: fields [{}] partially cover compound index {}",
                fields.join(", "),
                index
            ),
        }
    }
}

/// Immutable execution plan (no runtime state)
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub single_indexed: Vec<IndexedLookup>,
    pub compound_indexed: Vec<IndexedLookup>,
    /// AND-groups evaluated during the cursor pass
    pub cursor_required: Vec<AndGroup>,
    /// Ordering and windowing, in application order
    pub additions: Vec<QueryAddition>,
    pub forced: Option<ForceReason>,
    /// The single lookup already yields records in the first ordering
    pub native_ordering: bool,
    pub diagnostics: Vec<PlanDiagnostic>,
    pub is_universal_true: bool,
    pub is_universal_false: bool,
}

impl QueryPlan {
    fn empty(additions: &[QueryAddition]) -> Self {
        Self {
            single_indexed: Vec::new(),
            compound_indexed: Vec::new(),
            cursor_required: Vec::new(),
            additions: additions.to_vec(),
            forced: None,
            native_ordering: false,
            diagnostics: Vec::new(),
            is_universal_true: false,
            is_universal_false: false,
        }
    }

    /// All indexed lookups, compound first
    pub fn lookups(&self) -> impl Iterator<Item = &IndexedLookup> {
        self.compound_indexed.iter().chain(&self.single_indexed)
    }

    pub fn lookup_count(&self) -> usize {
        self.compound_indexed.len() + self.single_indexed.len()
    }

    pub fn has_cursor(&self) -> bool {
        !self.cursor_required.is_empty()
    }

    /// True when the cursor pass is the only record source
    pub fn is_cursor_only(&self) -> bool {
        self.has_cursor() && self.lookup_count() == 0
    }

    /// True when the plan cannot produce any record
    pub fn is_empty(&self) -> bool {
        !self.has_cursor() && self.lookup_count() == 0
    }
}

/// Partitions compiled filters into indexed lookups and cursor groups
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanner<'a> {
    catalog: &'a IndexCatalog,
    cursor_fallback: bool,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(catalog: &'a IndexCatalog) -> Self {
        Self {
            catalog,
            cursor_fallback: true,
        }
    }

    /// When disabled, ordering on an unindexed field fails with
    /// `IndexNotFound` instead of forcing the cursor path
    pub fn with_cursor_fallback(mut self, enabled: bool) -> Self {
        self.cursor_fallback = enabled;
        self
    }

    /// Plans a compiled filter with its additions
    pub fn plan(
        &self,
        filter: &CompiledFilter,
        additions: &[QueryAddition],
    ) -> PlanResult<QueryPlan> {
        validate_additions(additions)?;

        let mut plan = QueryPlan::empty(additions);
        plan.is_universal_true = filter.is_universal_true();
        plan.is_universal_false = filter.is_universal_false();
        if filter.is_universal_false() {
            return Ok(plan);
        }

        let order_fields = ordering_fields(additions);
        let mut forced = None;
        for field in &order_fields {
            if !self.catalog.is_indexed(field) {
                if !self.cursor_fallback {
                    return Err(PlanError::index_not_found(*field));
                }
                forced = Some(ForceReason::UnindexedOrdering {
                    field: field.to_string(),
                });
                break;
            }
        }
        if forced.is_none() && take_last_without_ordering(additions) {
            forced = Some(ForceReason::TakeLastWithoutOrdering);
        }

        // Index lookups only stream ascending, so descending order is
        // always produced by the windower
        let native_field = match additions.first() {
            Some(QueryAddition::OrderBy(field)) => Some(field.as_str()),
            _ => None,
        };

        let mut single = Vec::new();
        let mut compound = Vec::new();
        for group in filter.groups() {
            if group.is_empty() || !group.conditions().iter().all(FilterCondition::is_indexable) {
                plan.cursor_required.push(group.clone());
                continue;
            }
            if let Some(access) = self.compound_access(group) {
                compound.push(IndexedLookup::new(access, group.clone()));
                continue;
            }
            self.note_partial_coverage(group, &mut plan.diagnostics);
            match self.driving_access(group, native_field) {
                Some(access) => single.push(IndexedLookup::new(access, group.clone())),
                None => plan.cursor_required.push(group.clone()),
            }
        }

        plan.compound_indexed = merge_lookups(compound);
        plan.single_indexed = merge_lookups(single);

        let lookups = plan.lookup_count();
        if forced.is_none() && has_pagination(additions) && lookups > 1 {
            forced = Some(ForceReason::PaginatedMultipleLookups { lookups });
        }

        if forced.is_some() {
            plan.single_indexed.clear();
            plan.compound_indexed.clear();
            plan.cursor_required = filter.groups().to_vec();
        }
        plan.forced = forced;

        let lookups: Vec<&IndexedLookup> = plan.lookups().collect();
        let native_ordering = plan.forced.is_none()
            && !plan.has_cursor()
            && !has_stable_ordering(additions)
            && match (native_field, lookups.as_slice()) {
                (Some(field), [only]) => only.access.preserves_order_of(field),
                _ => false,
            };
        plan.native_ordering = native_ordering;

        Ok(plan)
    }

    /// Compound primary-key or compound-index access for a group
    fn compound_access(&self, group: &AndGroup) -> Option<IndexAccess> {
        if self.catalog.has_compound_primary_key() {
            let values = equality_values(group, self.catalog.primary_key());
            if let Some(key) = values.and_then(|v| PrimaryKey::from_values(v.iter())) {
                return Some(IndexAccess::PrimaryKeys { keys: vec![key] });
            }
        }

        let index = self.catalog.compound_index_for(&group.fields())?;
        let values = equality_values(group, index.fields())?;
        Some(IndexAccess::CompoundEqual {
            fields: index.fields().to_vec(),
            values,
        })
    }

    fn note_partial_coverage(&self, group: &AndGroup, diagnostics: &mut Vec<PlanDiagnostic>) {
        let fields = group.fields();
        for index in self.catalog.partially_covered(&fields) {
            let diagnostic = PlanDiagnostic::AmbiguousCompoundIndex {
                index: index.name(),
                fields: fields.iter().map(|f| f.to_string()).collect(),
            };
            if !diagnostics.contains(&diagnostic) {
                diagnostics.push(diagnostic);
            }
        }
    }

    /// Driving condition of a single-indexed group, or `None` if some field
    /// has no index
    fn driving_access(&self, group: &AndGroup, order_field: Option<&str>) -> Option<IndexAccess> {
        let mut best: Option<((u8, bool, &str), IndexAccess)> = None;

        for field in group.fields() {
            if !self.catalog.is_indexed(field) {
                return None;
            }
            let Some((priority, access)) = self.field_access(group, field) else {
                continue;
            };
            let rank = (priority, order_field != Some(field), field);
            if best.as_ref().map_or(true, |(current, _)| rank < *current) {
                best = Some((rank, access));
            }
        }

        best.map(|(_, access)| access)
    }

    fn field_access(&self, group: &AndGroup, field: &str) -> Option<(u8, IndexAccess)> {
        let conditions: Vec<&FilterCondition> = group.conditions_on(field).collect();
        let with_op = |op: FilterOperation| {
            conditions
                .iter()
                .find(|c| c.operation == op)
                .and_then(|c| c.value.clone())
        };

        if let Some(value) = with_op(FilterOperation::Equal) {
            let priority = if self.catalog.is_primary_key_field(field) {
                0
            } else if self.catalog.is_unique(field) {
                1
            } else {
                2
            };
            return Some((
                priority,
                IndexAccess::Equal {
                    field: field.to_string(),
                    value,
                },
            ));
        }
        if let Some(Value::Array(values)) = with_op(FilterOperation::In) {
            return Some((
                2,
                IndexAccess::In {
                    field: field.to_string(),
                    values,
                },
            ));
        }
        if let Some(range) = merge_range(conditions.iter().copied()) {
            return Some((
                3,
                IndexAccess::Range {
                    field: field.to_string(),
                    range,
                },
            ));
        }
        if let Some(Value::String(prefix)) = with_op(FilterOperation::StartsWith) {
            return Some((
                4,
                IndexAccess::Prefix {
                    field: field.to_string(),
                    prefixes: vec![prefix],
                },
            ));
        }
        with_op(FilterOperation::NotEqual).map(|value| {
            (
                5,
                IndexAccess::NotEqual {
                    field: field.to_string(),
                    value,
                },
            )
        })
    }
}

/// Equality operands for `fields`, in that order, if every field has one
fn equality_values(group: &AndGroup, fields: &[String]) -> Option<Vec<Value>> {
    fields
        .iter()
        .map(|field| {
            group
                .conditions_on(field)
                .find(|c| c.operation == FilterOperation::Equal)
                .and_then(|c| c.value.clone())
        })
        .collect()
}

fn validate_additions(additions: &[QueryAddition]) -> PlanResult<()> {
    for addition in additions {
        if addition.order_field().is_some_and(str::is_empty) {
            return Err(PlanError::InvalidAddition {
                addition: addition.to_string(),
                reason: "ordering field is empty".into(),
            });
        }
    }
    Ok(())
}

/// Merge pass: equality and `In` lookups on one field become one `In`,
/// prefix lookups on one field become one prefix set, and primary-key
/// fetches are batched together
fn merge_lookups(lookups: Vec<IndexedLookup>) -> Vec<IndexedLookup> {
    let mut merged: Vec<IndexedLookup> = Vec::with_capacity(lookups.len());
    for lookup in lookups {
        match merged.iter_mut().find(|m| mergeable(&m.access, &lookup.access)) {
            Some(target) => {
                target.access = combine(&target.access, lookup.access);
                target.groups.extend(lookup.groups);
            }
            None => merged.push(lookup),
        }
    }
    merged
}

fn mergeable(a: &IndexAccess, b: &IndexAccess) -> bool {
    use IndexAccess as A;
    match (a, b) {
        (A::Equal { .. } | A::In { .. }, A::Equal { .. } | A::In { .. })
        | (A::Prefix { .. }, A::Prefix { .. }) => a.field() == b.field(),
        (A::PrimaryKeys { .. }, A::PrimaryKeys { .. }) => true,
        _ => false,
    }
}

fn combine(a: &IndexAccess, b: IndexAccess) -> IndexAccess {
    use IndexAccess as A;
    match (a, b) {
        (A::Prefix { field, prefixes }, A::Prefix { prefixes: more, .. }) => {
            let mut prefixes = prefixes.clone();
            for prefix in more {
                if !prefixes.contains(&prefix) {
                    prefixes.push(prefix);
                }
            }
            A::Prefix {
                field: field.clone(),
                prefixes,
            }
        }
        (A::PrimaryKeys { keys }, A::PrimaryKeys { keys: more }) => {
            let mut keys = keys.clone();
            for key in more {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            A::PrimaryKeys { keys }
        }
        (a, b) => {
            let field = a.field().unwrap_or_default().to_string();
            let mut values = set_values(a);
            for value in set_values(&b) {
                if !values.iter().any(|v| value_key(v) == value_key(&value)) {
                    values.push(value);
                }
            }
            A::In { field, values }
        }
    }
}

fn set_values(access: &IndexAccess) -> Vec<Value> {
    match access {
        IndexAccess::Equal { value, .. } => vec![value.clone()],
        IndexAccess::In { values, .. } => values.clone(),
        _ => Vec::new(),
    }
}

/// Plans with default settings
pub fn plan(
    filter: &CompiledFilter,
    additions: &[QueryAddition],
    catalog: &IndexCatalog,
) -> PlanResult<QueryPlan> {
    QueryPlanner::new(catalog).plan(filter, additions)
}
