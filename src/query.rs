//! Fluent query builder
//!
//! A `Query` is an immutable value: every builder call returns an extended
//! copy and leaves the receiver untouched, so partial queries can be shared
//! and branched. Filters are AND-combined; additions keep call order.

use crate::compiler::{CompileResult, CompiledFilter, Expr, PredicateCompiler};
use crate::condition::QueryAddition;

/// Filters plus ordering and windowing directives
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Expr>,
    additions: Vec<QueryAddition>,
}

impl Query {
    /// A query matching every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter, AND-combined with earlier ones
    pub fn filter(&self, expr: Expr) -> Self {
        let mut next = self.clone();
        next.filters.push(expr);
        next
    }

    pub fn order_by(&self, field: impl Into<String>) -> Self {
        self.with(QueryAddition::OrderBy(field.into()))
    }

    pub fn order_by_descending(&self, field: impl Into<String>) -> Self {
        self.with(QueryAddition::OrderByDescending(field.into()))
    }

    pub fn skip(&self, n: usize) -> Self {
        self.with(QueryAddition::Skip(n))
    }

    pub fn take(&self, n: usize) -> Self {
        self.with(QueryAddition::Take(n))
    }

    pub fn take_last(&self, n: usize) -> Self {
        self.with(QueryAddition::TakeLast(n))
    }

    pub fn first(&self) -> Self {
        self.with(QueryAddition::First)
    }

    pub fn last(&self) -> Self {
        self.with(QueryAddition::Last)
    }

    /// Ignore index-native ordering; only explicit sorts and key order apply
    pub fn stable_ordering(&self) -> Self {
        self.with(QueryAddition::StableOrdering)
    }

    /// Appends an arbitrary addition
    pub fn with(&self, addition: QueryAddition) -> Self {
        let mut next = self.clone();
        next.additions.push(addition);
        next
    }

    pub fn filters(&self) -> &[Expr] {
        &self.filters
    }

    pub fn additions(&self) -> &[QueryAddition] {
        &self.additions
    }

    /// Compiles the AND of all filters
    pub fn compile(&self, compiler: &PredicateCompiler) -> CompileResult<CompiledFilter> {
        compiler.compile_all(&self.filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_is_copy_on_extend() {
        let base = Query::new().filter(Expr::gt("age", json!(30)));
        let paged = base.order_by("age").skip(1).take(3);

        assert!(base.additions().is_empty());
        assert_eq!(
            paged.additions(),
            &[
                QueryAddition::OrderBy("age".into()),
                QueryAddition::Skip(1),
                QueryAddition::Take(3),
            ]
        );
        assert_eq!(paged.filters().len(), 1);
    }

    #[test]
    fn test_filters_are_and_combined() {
        let query = Query::new()
            .filter(Expr::gt("age", json!(30)))
            .filter(Expr::eq("testInt", json!(9)));
        let compiled = query.compile(&PredicateCompiler::default()).unwrap();
        assert_eq!(compiled.groups().len(), 1);
        assert_eq!(compiled.groups()[0].len(), 2);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let compiled = Query::new().compile(&PredicateCompiler::default()).unwrap();
        assert!(compiled.is_universal_true());
    }
}
