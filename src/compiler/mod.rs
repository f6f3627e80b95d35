//! Predicate compiler
//!
//! Turns a host expression tree into a canonical two-level OR-of-ANDs:
//!
//! 1. Lowering with negation pushed to the leaves (De Morgan, inversion tables)
//! 2. Flattening, constant folding and the nesting-shape check
//! 3. Distribution of AND over OR, bounded by `max_dnf_groups`
//! 4. Canonical ordering, deduplication, contradiction elimination and
//!    subsumption
//!
//! Compilation is synchronous and pure. Compiling the expression form of a
//! compiled filter yields the same filter.

mod dnf;
mod errors;
mod expr;
mod lower;
mod simplify;

use serde::{Deserialize, Serialize};

pub use errors::{CompileError, CompileResult};
pub use expr::{Expr, FieldRef, FieldType, Operand};

use crate::condition::{AndGroup, OrGroup};

/// Default cap on AND-groups produced by distribution
pub const DEFAULT_MAX_DNF_GROUPS: usize = 1024;

/// Compiled filter: canonical DNF plus the degenerate-constant flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledFilter {
    or_group: OrGroup,
    is_universal_true: bool,
    is_universal_false: bool,
}

impl CompiledFilter {
    /// Wraps an OR-list, deriving the universal flags from its shape
    pub fn new(or_group: OrGroup) -> Self {
        if or_group.is_always() {
            return Self::always();
        }
        let is_universal_false = or_group.is_empty();
        Self {
            or_group,
            is_universal_true: false,
            is_universal_false,
        }
    }

    /// Filter matching every record
    pub fn always() -> Self {
        Self {
            or_group: OrGroup::always(),
            is_universal_true: true,
            is_universal_false: false,
        }
    }

    /// Filter matching no record
    pub fn never() -> Self {
        Self {
            or_group: OrGroup::never(),
            is_universal_true: false,
            is_universal_false: true,
        }
    }

    pub fn or_group(&self) -> &OrGroup {
        &self.or_group
    }

    pub fn groups(&self) -> &[AndGroup] {
        self.or_group.groups()
    }

    pub fn is_universal_true(&self) -> bool {
        self.is_universal_true
    }

    pub fn is_universal_false(&self) -> bool {
        self.is_universal_false
    }

    /// Expression form of this filter
    pub fn to_expr(&self) -> Expr {
        Expr::from(&self.or_group)
    }
}

/// Expression-to-DNF compiler
#[derive(Debug, Clone, Copy)]
pub struct PredicateCompiler {
    max_dnf_groups: usize,
}

impl Default for PredicateCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DNF_GROUPS)
    }
}

impl PredicateCompiler {
    pub fn new(max_dnf_groups: usize) -> Self {
        Self { max_dnf_groups }
    }

    pub fn max_dnf_groups(&self) -> usize {
        self.max_dnf_groups
    }

    /// Compiles `expr` into canonical DNF
    pub fn compile(&self, expr: &Expr) -> CompileResult<CompiledFilter> {
        let node = dnf::flatten(lower::lower(expr, false)?);
        dnf::check_shape(&node)?;
        let groups = dnf::distribute(node, self.max_dnf_groups)?;
        Ok(CompiledFilter::new(simplify::simplify(groups)))
    }

    /// Compiles the AND of several filters; no filters match everything
    pub fn compile_all(&self, exprs: &[Expr]) -> CompileResult<CompiledFilter> {
        match exprs {
            [] => Ok(CompiledFilter::always()),
            [single] => self.compile(single),
            many => self.compile(&Expr::And(many.to_vec())),
        }
    }
}

/// Compiles `expr` with the default group limit
pub fn compile(expr: &Expr) -> CompileResult<CompiledFilter> {
    PredicateCompiler::default().compile(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{FilterCondition, FilterOperation};
    use serde_json::json;

    #[test]
    fn test_constant_predicates() {
        let all = compile(&Expr::Constant(true)).unwrap();
        assert!(all.is_universal_true());
        assert_eq!(all.groups().len(), 1);

        let none = compile(&(Expr::gt("age", json!(1)) & Expr::Constant(false))).unwrap();
        assert!(none.is_universal_false());
        assert!(none.groups().is_empty());
    }

    #[test]
    fn test_tautology_by_subsumption() {
        let expr = Expr::gt("age", json!(1)) | Expr::Constant(true);
        assert!(compile(&expr).unwrap().is_universal_true());
    }

    #[test]
    fn test_contradiction_compiles_to_false() {
        let expr = Expr::eq("age", json!(3)) & Expr::eq("age", json!(4));
        assert!(compile(&expr).unwrap().is_universal_false());
    }

    #[test]
    fn test_de_morgan() {
        // !(a > 1 && b == 2) => a <= 1 || b != 2
        let expr = !(Expr::gt("a", json!(1)) & Expr::eq("b", json!(2)));
        let filter = compile(&expr).unwrap();
        let ops: Vec<FilterOperation> = filter
            .groups()
            .iter()
            .map(|g| g.conditions()[0].operation)
            .collect();
        assert_eq!(
            ops,
            vec![FilterOperation::LessThanOrEqual, FilterOperation::NotEqual]
        );
    }

    #[test]
    fn test_order_independence() {
        let x = Expr::gt("age", json!(30)) & Expr::eq("name", json!("a"));
        let y = Expr::eq("name", json!("a")) & Expr::gt("age", json!(30));
        assert_eq!(compile(&x).unwrap(), compile(&y).unwrap());
    }

    #[test]
    fn test_recompiling_is_identity() {
        let expr = (Expr::gt("age", json!(30)) | Expr::one_of("city", vec![json!("a"), json!("b")]))
            & Expr::is_not_null("name");
        let first = compile(&expr).unwrap();
        let second = compile(&first.to_expr()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.groups().len(), 3);
    }

    #[test]
    fn test_compile_all_combines_with_and() {
        let compiler = PredicateCompiler::new(8);
        let filter = compiler
            .compile_all(&[Expr::gt("age", json!(1)), Expr::lt("age", json!(9))])
            .unwrap();
        assert_eq!(filter.groups().len(), 1);
        assert_eq!(filter.groups()[0].len(), 2);
        assert!(compiler.compile_all(&[]).unwrap().is_universal_true());
    }

    #[test]
    fn test_invalid_condition_rejected() {
        let bad = FilterCondition::unary("age", FilterOperation::Equal);
        assert!(matches!(
            compile(&Expr::from(bad)),
            Err(CompileError::InvalidCondition(_))
        ));
    }
}
