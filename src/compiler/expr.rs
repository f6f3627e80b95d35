//! Host-facing predicate expression tree
//!
//! Hosts describe a filter as an `Expr`: comparisons and method-style calls
//! joined by AND/OR/NOT. The tree is deliberately permissive; everything the
//! compiler cannot express as field conditions is rejected during lowering.

use std::ops::{BitAnd, BitOr, Not};

use serde_json::Value;

use crate::condition::{AndGroup, Comparison, DatePart, FilterCondition, OrGroup};
use crate::value::ValueKind;

/// Declared storage type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    Scalar,
    String,
    Array,
}

/// Reference to a record field (dotted paths address nested fields)
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    pub name: String,
    pub ty: FieldType,
}

impl FieldRef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Scalar)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Array)
    }
}

/// One side of a comparison or a call
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(FieldRef),
    Literal(Value),
    /// Literal collection, only valid as the target of `contains`
    List(Vec<Value>),
    /// Length of a string or array field
    Length(FieldRef),
    /// Component extracted from a date field
    DatePart(FieldRef, DatePart),
}

impl Operand {
    pub fn field(name: impl Into<String>) -> Self {
        Operand::Field(FieldRef::scalar(name))
    }

    pub fn literal(value: Value) -> Self {
        Operand::Literal(value)
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Operand::Field(f) => f.name.clone(),
            Operand::Literal(v) => v.to_string(),
            Operand::List(_) => "list".into(),
            Operand::Length(f) => format!("{}.length", f.name),
            Operand::DatePart(f, part) => format!("{}.{}", f.name, part.as_str()),
        }
    }
}

/// Boolean predicate over a single record
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(bool),
    /// Boolean field used directly as a predicate
    Field(FieldRef),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Compare {
        left: Operand,
        op: Comparison,
        right: Operand,
    },
    /// Method-style predicate: `target.method(args)`
    Call {
        target: Operand,
        method: String,
        args: Vec<Operand>,
        ignore_case: bool,
    },
    TypeCheck {
        field: FieldRef,
        kind: ValueKind,
    },
    /// Already-built field condition
    Condition(FilterCondition),
}

impl Expr {
    pub fn compare(left: Operand, op: Comparison, right: Operand) -> Self {
        Expr::Compare { left, op, right }
    }

    fn field_compare(field: impl Into<String>, op: Comparison, value: Value) -> Self {
        Self::compare(Operand::field(field), op, Operand::Literal(value))
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::field_compare(field, Comparison::Equal, value)
    }

    pub fn ne(field: impl Into<String>, value: Value) -> Self {
        Self::field_compare(field, Comparison::NotEqual, value)
    }

    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::field_compare(field, Comparison::GreaterThan, value)
    }

    pub fn gte(field: impl Into<String>, value: Value) -> Self {
        Self::field_compare(field, Comparison::GreaterThanOrEqual, value)
    }

    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Self::field_compare(field, Comparison::LessThan, value)
    }

    pub fn lte(field: impl Into<String>, value: Value) -> Self {
        Self::field_compare(field, Comparison::LessThanOrEqual, value)
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::eq(field, Value::Null)
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::ne(field, Value::Null)
    }

    pub fn call(target: Operand, method: impl Into<String>, args: Vec<Operand>) -> Self {
        Expr::Call {
            target,
            method: method.into(),
            args,
            ignore_case: false,
        }
    }

    /// `values.contains(field)`: field equals any of `values`
    pub fn one_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::call(Operand::List(values), "contains", vec![Operand::field(field)])
    }

    /// `field.contains(value)`: substring for string fields, element for arrays
    pub fn contains(field: FieldRef, value: Value) -> Self {
        Self::call(Operand::Field(field), "contains", vec![Operand::Literal(value)])
    }

    pub fn starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::call(
            Operand::Field(FieldRef::string(field)),
            "starts_with",
            vec![Operand::Literal(Value::String(prefix.into()))],
        )
    }

    pub fn ends_with(field: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::call(
            Operand::Field(FieldRef::string(field)),
            "ends_with",
            vec![Operand::Literal(Value::String(suffix.into()))],
        )
    }

    /// `field.equals(value)`, usually combined with `ignoring_case`
    pub fn equals(field: impl Into<String>, value: Value) -> Self {
        Self::call(
            Operand::Field(FieldRef::string(field)),
            "equals",
            vec![Operand::Literal(value)],
        )
    }

    pub fn length(field: FieldRef, op: Comparison, length: u64) -> Self {
        Self::compare(Operand::Length(field), op, Operand::Literal(length.into()))
    }

    pub fn date_part(field: impl Into<String>, part: DatePart, op: Comparison, value: i64) -> Self {
        Self::compare(
            Operand::DatePart(FieldRef::scalar(field), part),
            op,
            Operand::Literal(value.into()),
        )
    }

    pub fn is_type(field: impl Into<String>, kind: ValueKind) -> Self {
        Expr::TypeCheck {
            field: FieldRef::scalar(field),
            kind,
        }
    }

    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::And(exprs.into_iter().collect())
    }

    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Makes a method-style call compare case-insensitively
    pub fn ignoring_case(self) -> Self {
        match self {
            Expr::Call {
                target,
                method,
                args,
                ..
            } => Expr::Call {
                target,
                method,
                args,
                ignore_case: true,
            },
            other => other,
        }
    }
}

impl BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr {
        Expr::And(vec![self, rhs])
    }
}

impl BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr {
        Expr::Or(vec![self, rhs])
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl From<FilterCondition> for Expr {
    fn from(condition: FilterCondition) -> Self {
        Expr::Condition(condition)
    }
}

impl From<&AndGroup> for Expr {
    fn from(group: &AndGroup) -> Self {
        Expr::And(group.conditions().iter().cloned().map(Expr::from).collect())
    }
}

/// Re-expresses a DNF root as an expression
impl From<&OrGroup> for Expr {
    fn from(or_group: &OrGroup) -> Self {
        Expr::Or(or_group.groups().iter().map(Expr::from).collect())
    }
}
