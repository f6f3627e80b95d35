//! Lowering: expression tree to condition tree in negation normal form
//!
//! Negations are pushed to the leaves while lowering (De Morgan over
//! AND/OR, inversion tables at the leaves), so the resulting `Node` tree
//! holds no NOT. Each leaf is a validated `FilterCondition`.

use serde_json::Value;

use super::errors::{CompileError, CompileResult};
use super::expr::{Expr, FieldRef, FieldType, Operand};
use crate::condition::{Comparison, FilterCondition, FilterOperation};
use crate::value::{compare_scalars, values_equal, ValueKind};

/// Negation-free condition tree
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Const(bool),
    Leaf(FilterCondition),
    /// OR of equalities produced by `list.contains(field)`; exempt from the
    /// nested-OR shape restriction
    Membership(Vec<FilterCondition>),
    And(Vec<Node>),
    Or(Vec<Node>),
}

/// Lowers `expr`, negating it when `negated` is set
pub(crate) fn lower(expr: &Expr, negated: bool) -> CompileResult<Node> {
    match expr {
        Expr::Constant(value) => Ok(Node::Const(*value != negated)),
        Expr::Not(inner) => lower(inner, !negated),
        Expr::And(parts) => {
            let nodes = parts
                .iter()
                .map(|p| lower(p, negated))
                .collect::<CompileResult<Vec<_>>>()?;
            Ok(if negated { Node::Or(nodes) } else { Node::And(nodes) })
        }
        Expr::Or(parts) => {
            let nodes = parts
                .iter()
                .map(|p| lower(p, negated))
                .collect::<CompileResult<Vec<_>>>()?;
            Ok(if negated { Node::And(nodes) } else { Node::Or(nodes) })
        }
        Expr::Field(field) => leaf(
            FilterCondition::new(&field.name, FilterOperation::Equal, Value::Bool(true)),
            negated,
        ),
        Expr::Compare { left, op, right } => lower_compare(left, *op, right, negated),
        Expr::Call {
            target,
            method,
            args,
            ignore_case,
        } => lower_call(target, method, args, *ignore_case, negated),
        Expr::TypeCheck { field, kind } => {
            let condition = match kind {
                ValueKind::Null => FilterCondition::is_null(&field.name),
                kind => FilterCondition::unary(&field.name, FilterOperation::IsType(*kind)),
            };
            leaf(condition, negated)
        }
        Expr::Condition(condition) => leaf(null_checked(condition), negated),
    }
}

/// Prebuilt `== null` / `!= null` conditions become null checks, like
/// comparisons against a null literal
fn null_checked(condition: &FilterCondition) -> FilterCondition {
    match (condition.operation, &condition.value) {
        (FilterOperation::Equal, Some(Value::Null)) => FilterCondition::is_null(&condition.property),
        (FilterOperation::NotEqual, Some(Value::Null)) => {
            FilterCondition::is_not_null(&condition.property)
        }
        _ => condition.clone(),
    }
}

fn leaf(condition: FilterCondition, negated: bool) -> CompileResult<Node> {
    let condition = if negated {
        condition.negated()
    } else {
        condition
    };
    condition.validate()?;
    Ok(Node::Leaf(condition))
}

/// Equality against a literal; null equality becomes a null check
fn equality(field: &FieldRef, value: &Value, case_sensitive: bool) -> FilterCondition {
    if value.is_null() {
        return FilterCondition::is_null(&field.name);
    }
    field_condition(field, FilterOperation::Equal, value.clone()).with_case_sensitive(case_sensitive)
}

fn field_condition(field: &FieldRef, operation: FilterOperation, value: Value) -> FilterCondition {
    let is_string = value.is_string() || field.ty == FieldType::String;
    FilterCondition::new(&field.name, operation, value).with_string(is_string)
}

fn lower_compare(
    left: &Operand,
    op: Comparison,
    right: &Operand,
    negated: bool,
) -> CompileResult<Node> {
    // Literal on the left: `5 < age` is `age > 5`
    let (subject, op, literal) = match (left, right) {
        (Operand::Literal(a), Operand::Literal(b)) => {
            let holds = match op {
                Comparison::Equal => values_equal(a, b),
                Comparison::NotEqual => !values_equal(a, b),
                ordering => compare_scalars(a, b).is_some_and(|o| ordering.holds(o)),
            };
            return Ok(Node::Const(holds != negated));
        }
        (subject, Operand::Literal(value)) => (subject, op, value),
        (Operand::Literal(value), subject) => (subject, op.flip(), value),
        _ => {
            return Err(CompileError::unsupported_operation(format!(
                "comparison {} {} {}",
                left.describe(),
                op.symbol(),
                right.describe()
            )))
        }
    };

    let condition = match subject {
        Operand::Field(field) if literal.is_null() => match op {
            Comparison::Equal => FilterCondition::is_null(&field.name),
            Comparison::NotEqual => FilterCondition::is_not_null(&field.name),
            _ => {
                return Err(CompileError::unsupported_operation(format!(
                    "{} {} null",
                    field.name,
                    op.symbol()
                )))
            }
        },
        Operand::Field(field) => {
            field_condition(field, FilterOperation::compare(op), literal.clone())
        }
        Operand::Length(field) => {
            FilterCondition::new(&field.name, FilterOperation::Length(op), literal.clone())
        }
        Operand::DatePart(field, part) => {
            FilterCondition::new(&field.name, FilterOperation::DatePart(*part, op), literal.clone())
        }
        other => {
            return Err(CompileError::unsupported_operation(format!(
                "comparison on {}",
                other.describe()
            )))
        }
    };

    leaf(condition, negated)
}

fn lower_call(
    target: &Operand,
    method: &str,
    args: &[Operand],
    ignore_case: bool,
    negated: bool,
) -> CompileResult<Node> {
    let unsupported = || {
        CompileError::unsupported_operation(format!("{}.{}()", target.describe(), method))
    };

    match (method, target, args) {
        ("contains", Operand::List(values), [Operand::Field(field)]) => {
            let members: Vec<FilterCondition> = values
                .iter()
                .map(|v| equality(field, v, !ignore_case))
                .collect();
            for member in &members {
                member.validate()?;
            }
            if negated {
                // NOT (a OR b) = NOT a AND NOT b
                let parts = members.into_iter().map(|m| leaf(m, true));
                return Ok(Node::And(parts.collect::<CompileResult<Vec<_>>>()?));
            }
            Ok(match members.len() {
                0 => Node::Const(false),
                _ => Node::Membership(members),
            })
        }
        ("contains", Operand::Field(field), [Operand::Literal(value)]) => {
            let operation = match field.ty {
                FieldType::Array => FilterOperation::ArrayContains,
                _ if value.is_string() => FilterOperation::Contains,
                _ => return Err(unsupported()),
            };
            let condition =
                field_condition(field, operation, value.clone()).with_case_sensitive(!ignore_case);
            leaf(condition, negated)
        }
        ("starts_with" | "ends_with", Operand::Field(field), [Operand::Literal(value)]) => {
            let operation = if method == "starts_with" {
                FilterOperation::StartsWith
            } else {
                FilterOperation::EndsWith
            };
            let condition =
                field_condition(field, operation, value.clone()).with_case_sensitive(!ignore_case);
            leaf(condition, negated)
        }
        ("equals", Operand::Field(field), [Operand::Literal(value)]) => {
            leaf(equality(field, value, !ignore_case), negated)
        }
        _ => Err(unsupported()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::DatePart;
    use serde_json::json;

    fn leaf_of(node: Node) -> FilterCondition {
        match node {
            Node::Leaf(c) => c,
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_literal_on_left_is_flipped() {
        let expr = Expr::compare(
            Operand::literal(json!(5)),
            Comparison::LessThan,
            Operand::field("age"),
        );
        let c = leaf_of(lower(&expr, false).unwrap());
        assert_eq!(c.operation, FilterOperation::GreaterThan);
        assert_eq!(c.value, Some(json!(5)));
    }

    #[test]
    fn test_null_equality_becomes_null_check() {
        let c = leaf_of(lower(&Expr::is_null("name"), false).unwrap());
        assert_eq!(c.operation, FilterOperation::IsNull);
        let c = leaf_of(lower(&Expr::is_null("name"), true).unwrap());
        assert_eq!(c.operation, FilterOperation::IsNotNull);
        assert!(lower(&Expr::gt("name", Value::Null), false).is_err());
    }

    #[test]
    fn test_prebuilt_null_equality_becomes_null_check() {
        let eq_null = Expr::from(FilterCondition::eq("name", Value::Null));
        let c = leaf_of(lower(&eq_null, false).unwrap());
        assert_eq!(c.operation, FilterOperation::IsNull);
        assert_eq!(c.value, None);
        let c = leaf_of(lower(&eq_null, true).unwrap());
        assert_eq!(c.operation, FilterOperation::IsNotNull);

        let ne_null = Expr::from(FilterCondition::ne("name", Value::Null));
        let c = leaf_of(lower(&ne_null, false).unwrap());
        assert_eq!(c.operation, FilterOperation::IsNotNull);
    }

    #[test]
    fn test_negation_pushed_to_leaves() {
        let expr = !(Expr::gt("age", json!(30)) | Expr::starts_with("name", "a"));
        match lower(&expr, false).unwrap() {
            Node::And(parts) => {
                let ops: Vec<FilterOperation> =
                    parts.into_iter().map(|p| leaf_of(p).operation).collect();
                assert_eq!(
                    ops,
                    vec![FilterOperation::LessThanOrEqual, FilterOperation::NotStartsWith]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_double_negation_of_not_equal() {
        let expr = !!Expr::ne("age", json!(3));
        let c = leaf_of(lower(&expr, false).unwrap());
        assert_eq!(c.operation, FilterOperation::NotEqual);
        let c = leaf_of(lower(&!expr, false).unwrap());
        assert_eq!(c.operation, FilterOperation::Equal);
    }

    #[test]
    fn test_membership_expands_per_element() {
        let expr = Expr::one_of("age", vec![json!(1), json!(2), Value::Null]);
        match lower(&expr, false).unwrap() {
            Node::Membership(members) => {
                assert_eq!(members.len(), 3);
                assert_eq!(members[2].operation, FilterOperation::IsNull);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            lower(&Expr::one_of("age", vec![]), false).unwrap(),
            Node::Const(false)
        );
    }

    #[test]
    fn test_contains_depends_on_field_type() {
        let tags = lower(&Expr::contains(FieldRef::array("tags"), json!("x")), false).unwrap();
        assert_eq!(leaf_of(tags).operation, FilterOperation::ArrayContains);
        let name = lower(&Expr::contains(FieldRef::string("name"), json!("x")), false).unwrap();
        assert_eq!(leaf_of(name).operation, FilterOperation::Contains);
    }

    #[test]
    fn test_length_and_date_part() {
        let c = leaf_of(
            lower(&Expr::length(FieldRef::string("name"), Comparison::GreaterThan, 3), true)
                .unwrap(),
        );
        assert_eq!(c.operation, FilterOperation::Length(Comparison::LessThanOrEqual));

        let c = leaf_of(
            lower(&Expr::date_part("born", DatePart::Year, Comparison::Equal, 1990), false)
                .unwrap(),
        );
        assert_eq!(
            c.operation,
            FilterOperation::DatePart(DatePart::Year, Comparison::Equal)
        );
    }

    #[test]
    fn test_constant_folding() {
        let expr = Expr::compare(
            Operand::literal(json!(2)),
            Comparison::GreaterThan,
            Operand::literal(json!(1)),
        );
        assert_eq!(lower(&expr, false).unwrap(), Node::Const(true));
        assert_eq!(lower(&expr, true).unwrap(), Node::Const(false));
    }

    #[test]
    fn test_unsupported_operations() {
        let unknown = Expr::call(Operand::field("name"), "matches", vec![]);
        assert!(matches!(
            lower(&unknown, false),
            Err(CompileError::UnsupportedPredicateOperation { .. })
        ));
        let field_vs_field = Expr::compare(
            Operand::field("a"),
            Comparison::Equal,
            Operand::field("b"),
        );
        assert!(matches!(
            lower(&field_vs_field, false),
            Err(CompileError::UnsupportedPredicateOperation { .. })
        ));
    }
}
