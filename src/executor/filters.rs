//! In-memory condition evaluation
//!
//! Evaluates AND-groups against fetched records. Used by the cursor pass and
//! as the residual check on records returned by indexed lookups.
//!
//! Null semantics: a missing or null field never satisfies a value predicate,
//! negated ones included. Only null checks and type checks observe nulls.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde_json::Value;

use crate::condition::{AndGroup, Comparison, DatePart, FilterCondition, FilterOperation};
use crate::store::Record;
use crate::value::{compare_scalars, fold_case, same_kind, values_equal};

/// Formats accepted for date-part extraction, tried after RFC 3339
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Evaluates conditions against records
pub struct ConditionFilter;

impl ConditionFilter {
    /// OR-of-ANDs: true if any group matches
    pub fn matches_any(record: &Record, groups: &[AndGroup]) -> bool {
        groups.iter().any(|group| Self::matches_group(record, group))
    }

    /// True if every condition of the group matches. The empty group matches.
    pub fn matches_group(record: &Record, group: &AndGroup) -> bool {
        group
            .conditions()
            .iter()
            .all(|condition| Self::matches_condition(record, condition))
    }

    /// Evaluates one condition
    pub fn matches_condition(record: &Record, condition: &FilterCondition) -> bool {
        let actual = record.get(&condition.property);

        match condition.operation {
            FilterOperation::IsNull => return actual.map_or(true, Value::is_null),
            FilterOperation::IsNotNull => return actual.is_some_and(|v| !v.is_null()),
            FilterOperation::IsType(kind) => return kind.matches(actual.unwrap_or(&Value::Null)),
            FilterOperation::IsNotType(kind) => {
                return !kind.matches(actual.unwrap_or(&Value::Null))
            }
            _ => {}
        }

        let (Some(actual), Some(expected)) = (actual.filter(|v| !v.is_null()), &condition.value)
        else {
            return false;
        };

        if condition.case_sensitive {
            Self::evaluate(condition.operation, actual, expected)
        } else {
            Self::evaluate(condition.operation, &fold(actual), &fold(expected))
        }
    }

    fn evaluate(operation: FilterOperation, actual: &Value, expected: &Value) -> bool {
        match operation {
            FilterOperation::Equal => values_equal(actual, expected),
            FilterOperation::NotEqual => {
                same_kind(actual, expected) && !values_equal(actual, expected)
            }
            FilterOperation::GreaterThan
            | FilterOperation::GreaterThanOrEqual
            | FilterOperation::LessThan
            | FilterOperation::LessThanOrEqual => match operation.as_comparison() {
                Some(cmp) => Self::compare(actual, expected, cmp),
                None => false,
            },
            FilterOperation::In => Self::in_list(actual, expected),
            FilterOperation::NotIn => expected.is_array() && !Self::in_list(actual, expected),
            FilterOperation::StartsWith => Self::strings(actual, expected, |a, e| a.starts_with(e)),
            FilterOperation::NotStartsWith => {
                Self::strings(actual, expected, |a, e| !a.starts_with(e))
            }
            FilterOperation::EndsWith => Self::strings(actual, expected, |a, e| a.ends_with(e)),
            FilterOperation::NotEndsWith => Self::strings(actual, expected, |a, e| !a.ends_with(e)),
            FilterOperation::Contains => Self::strings(actual, expected, |a, e| a.contains(e)),
            FilterOperation::NotContains => Self::strings(actual, expected, |a, e| !a.contains(e)),
            FilterOperation::ArrayContains => actual
                .as_array()
                .is_some_and(|items| items.iter().any(|item| values_equal(item, expected))),
            FilterOperation::ArrayNotContains => actual
                .as_array()
                .is_some_and(|items| !items.iter().any(|item| values_equal(item, expected))),
            FilterOperation::Length(cmp) => match length_of(actual) {
                Some(len) => Self::compare(&Value::from(len), expected, cmp),
                None => false,
            },
            FilterOperation::DatePart(part, cmp) => match date_part(actual, part) {
                Some(n) => Self::compare(&Value::from(n), expected, cmp),
                None => false,
            },
            FilterOperation::IsNull
            | FilterOperation::IsNotNull
            | FilterOperation::IsType(_)
            | FilterOperation::IsNotType(_) => false,
        }
    }

    fn compare(actual: &Value, expected: &Value, cmp: Comparison) -> bool {
        if cmp == Comparison::NotEqual && !same_kind(actual, expected) {
            return false;
        }
        compare_scalars(actual, expected).is_some_and(|ordering| cmp.holds(ordering))
    }

    fn in_list(actual: &Value, expected: &Value) -> bool {
        expected
            .as_array()
            .is_some_and(|list| list.iter().any(|v| values_equal(actual, v)))
    }

    fn strings(actual: &Value, expected: &Value, test: impl Fn(&str, &str) -> bool) -> bool {
        match (actual.as_str(), expected.as_str()) {
            (Some(a), Some(e)) => test(a, e),
            _ => false,
        }
    }
}

/// Case folding for case-insensitive conditions, one level into lists
fn fold(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(fold_case).collect()),
        other => fold_case(other),
    }
}

/// Character count of strings, element count of arrays
fn length_of(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => Some(s.chars().count() as u64),
        Value::Array(items) => Some(items.len() as u64),
        _ => None,
    }
}

/// Parses a stored date/time. Offsets are normalized to UTC.
fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    let text = value.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn date_part(value: &Value, part: DatePart) -> Option<i64> {
    let dt = parse_datetime(value)?;
    let n = match part {
        DatePart::Year => dt.year() as i64,
        DatePart::Month => dt.month() as i64,
        DatePart::Day => dt.day() as i64,
        DatePart::Hour => dt.hour() as i64,
        DatePart::Minute => dt.minute() as i64,
        DatePart::Second => dt.second() as i64,
        DatePart::DayOfWeek => dt.weekday().num_days_from_sunday() as i64,
        DatePart::DayOfYear => dt.ordinal() as i64,
    };
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;
    use serde_json::json;

    fn record() -> Record {
        Record::new(json!({
            "id": 1,
            "age": 35,
            "name": "Alice",
            "nickname": null,
            "tags": ["red", "blue"],
            "born": "1990-07-15T10:30:00Z",
            "address": {"city": "Oslo"}
        }))
    }

    fn check(condition: FilterCondition) -> bool {
        ConditionFilter::matches_condition(&record(), &condition)
    }

    #[test]
    fn test_comparisons() {
        assert!(check(FilterCondition::gt("age", json!(30))));
        assert!(check(FilterCondition::lte("age", json!(35.0))));
        assert!(!check(FilterCondition::lt("age", json!(35))));
        assert!(check(FilterCondition::eq("age", json!(35.0))));
        assert!(!check(FilterCondition::gt("age", json!("30"))));
    }

    #[test]
    fn test_null_and_missing_never_match_value_predicates() {
        assert!(!check(FilterCondition::ne("nickname", json!("x"))));
        assert!(!check(FilterCondition::ne("missing", json!(1))));
        assert!(!check(FilterCondition::new(
            "missing",
            FilterOperation::NotIn,
            json!([1])
        )));
        assert!(check(FilterCondition::is_null("nickname")));
        assert!(check(FilterCondition::is_null("missing")));
        assert!(!check(FilterCondition::is_not_null("nickname")));
        assert!(check(FilterCondition::unary(
            "missing",
            FilterOperation::IsType(ValueKind::Null)
        )));
    }

    #[test]
    fn test_not_equal_requires_same_kind() {
        assert!(check(FilterCondition::ne("age", json!(30))));
        assert!(!check(FilterCondition::ne("age", json!("thirty"))));
    }

    #[test]
    fn test_membership() {
        assert!(check(FilterCondition::new("age", FilterOperation::In, json!([1, 35]))));
        assert!(!check(FilterCondition::new("age", FilterOperation::In, json!([]))));
        assert!(check(FilterCondition::new("age", FilterOperation::NotIn, json!([1, 2]))));
    }

    #[test]
    fn test_string_operations_and_case_folding() {
        assert!(check(FilterCondition::starts_with("name", "Al")));
        assert!(!check(FilterCondition::starts_with("name", "al")));
        assert!(check(
            FilterCondition::starts_with("name", "al").with_case_sensitive(false)
        ));
        assert!(check(
            FilterCondition::eq("name", json!("ALICE")).with_case_sensitive(false)
        ));
        assert!(check(FilterCondition::new(
            "name",
            FilterOperation::EndsWith,
            json!("ice")
        )));
        assert!(check(FilterCondition::new(
            "name",
            FilterOperation::NotContains,
            json!("bob")
        )));
        assert!(!check(FilterCondition::new(
            "age",
            FilterOperation::NotContains,
            json!("bob")
        )));
    }

    #[test]
    fn test_array_and_length() {
        assert!(check(FilterCondition::new(
            "tags",
            FilterOperation::ArrayContains,
            json!("red")
        )));
        assert!(check(FilterCondition::new(
            "tags",
            FilterOperation::ArrayNotContains,
            json!("green")
        )));
        assert!(check(FilterCondition::new(
            "tags",
            FilterOperation::Length(Comparison::Equal),
            json!(2)
        )));
        assert!(check(FilterCondition::new(
            "name",
            FilterOperation::Length(Comparison::GreaterThan),
            json!(4)
        )));
    }

    #[test]
    fn test_date_parts() {
        let part = |p, v| {
            FilterCondition::new("born", FilterOperation::DatePart(p, Comparison::Equal), json!(v))
        };
        assert!(check(part(DatePart::Year, 1990)));
        assert!(check(part(DatePart::Month, 7)));
        assert!(check(part(DatePart::Hour, 10)));
        // 1990-07-15 was a Sunday
        assert!(check(part(DatePart::DayOfWeek, 0)));
        assert!(check(part(DatePart::DayOfYear, 196)));
        assert!(!check(FilterCondition::new(
            "name",
            FilterOperation::DatePart(DatePart::Year, Comparison::Equal),
            json!(1990)
        )));
    }

    #[test]
    fn test_date_formats() {
        for text in ["2021-03-04", "2021-03-04 05:06:07", "2021-03-04T05:06:07.5"] {
            let dt = parse_datetime(&json!(text)).unwrap();
            assert_eq!(dt.year(), 2021);
            assert_eq!(dt.day(), 4);
        }
        assert!(parse_datetime(&json!("yesterday")).is_none());
    }

    #[test]
    fn test_nested_paths_and_groups() {
        let group = AndGroup::new(vec![
            FilterCondition::eq("address.city", json!("Oslo")),
            FilterCondition::gt("age", json!(30)),
        ]);
        assert!(ConditionFilter::matches_group(&record(), &group));
        assert!(ConditionFilter::matches_group(&record(), &AndGroup::always()));

        let miss = AndGroup::new(vec![FilterCondition::eq("age", json!(1))]);
        assert!(ConditionFilter::matches_any(&record(), &[miss.clone(), group]));
        assert!(!ConditionFilter::matches_any(&record(), &[miss]));
        assert!(!ConditionFilter::matches_any(&record(), &[]));
    }
}
