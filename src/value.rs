//! Value comparison helpers shared by the compiler, planner and executor
//!
//! Record fields and condition operands are `serde_json::Value`s. Two kinds of
//! comparison exist:
//!
//! - `compare_scalars`: same-kind comparison used by filters. Values of different
//!   kinds are incomparable, so ordering predicates never match across kinds.
//! - `compare_values`: total ordering used for sorting.
//!   null < bool < number < string < array < object

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Value kinds addressable by type-check predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    /// Numbers without a fractional part
    Integer,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Returns the kind of a value. Integers report `Integer`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => ValueKind::Integer,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Returns true if `value` is of this kind. `Number` accepts integers.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::Number => value.is_number(),
            kind => ValueKind::of(value) == *kind,
        }
    }

    /// Returns true if no value can be of both kinds
    pub fn is_disjoint(&self, other: &ValueKind) -> bool {
        if self == other {
            return false;
        }
        !matches!(
            (self, other),
            (ValueKind::Number, ValueKind::Integer) | (ValueKind::Integer, ValueKind::Number)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::Integer => "integer",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact numeric value.
///
/// Integral numbers (integers, and floats without a fractional part that fit
/// in an `i128`) are held as `Int`, so 2^53 and 2^53 + 1 stay distinct and
/// `3` equals `3.0`. Everything else is an order-preserving encoding of the
/// float's bits. Ordering is numeric across both variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Numeric {
    Int(i128),
    Float(u64),
}

impl Numeric {
    pub fn of(number: &Number) -> Self {
        if let Some(i) = number.as_i64() {
            return Numeric::Int(i as i128);
        }
        if let Some(u) = number.as_u64() {
            return Numeric::Int(u as i128);
        }
        Self::from_f64(number.as_f64().unwrap_or(0.0))
    }

    pub fn from_f64(v: f64) -> Self {
        const I128_BOUND: f64 = 1.7014118346046923e38; // 2^127
        if v.fract() == 0.0 && v > -I128_BOUND && v < I128_BOUND {
            // -0.0 lands here as Int(0)
            return Numeric::Int(v as i128);
        }
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        Numeric::Float(ordered)
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(bits) => {
                let raw = if (bits >> 63) == 1 {
                    bits ^ (1 << 63)
                } else {
                    !bits
                };
                f64::from_bits(raw)
            }
        }
    }
}

/// Integer against a non-integral (or out of range) float. The saturating
/// cast keeps infinities and huge floats beyond every integer.
fn compare_int_float(i: i128, f: f64) -> Ordering {
    let whole = f.trunc() as i128;
    match i.cmp(&whole) {
        Ordering::Equal if f > f.trunc() => Ordering::Less,
        Ordering::Equal if f < f.trunc() => Ordering::Greater,
        ordering => ordering,
    }
}

impl Ord for Numeric {
    fn cmp(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (Numeric::Int(a), Numeric::Int(b)) => a.cmp(&b),
            (Numeric::Float(a), Numeric::Float(b)) => a.cmp(&b),
            (Numeric::Int(a), b @ Numeric::Float(_)) => compare_int_float(a, b.to_f64()),
            (a @ Numeric::Float(_), Numeric::Int(b)) => compare_int_float(b, a.to_f64()).reverse(),
        }
    }
}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(i) => write!(f, "{}", i),
            Numeric::Float(_) => write!(f, "{}", self.to_f64()),
        }
    }
}

/// Compares two scalars of the same kind.
///
/// Returns `None` when the values are of different kinds or are not scalars.
pub fn compare_scalars(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => Some(Numeric::of(a).cmp(&Numeric::of(b))),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Equality used by filters: numbers compare numerically, everything else
/// structurally.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match compare_scalars(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

/// Returns true if both values share a kind (integers and floats are one kind)
pub fn same_kind(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Total ordering over optional values for sorting.
///
/// Missing values sort first, then by kind, then naturally within a kind.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a_val), Some(b_val)) => {
            let a_rank = kind_rank(a_val);
            let b_rank = kind_rank(b_val);
            if a_rank != b_rank {
                return a_rank.cmp(&b_rank);
            }
            compare_scalars(a_val, b_val).unwrap_or(Ordering::Equal)
        }
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Stable textual form of a value, used as a canonical ordering key
pub fn value_key(value: &Value) -> String {
    match value {
        // Integral floats and integers must produce the same key
        Value::Number(n) => match Numeric::of(n) {
            Numeric::Int(i) => i.to_string(),
            Numeric::Float(_) => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Lower-cases string values, leaving other kinds untouched
pub fn fold_case(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other.clone(),
    }
}
