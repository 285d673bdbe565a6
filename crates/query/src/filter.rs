//! Predicate evaluation
//!
//! Comparisons follow the total order of [`crate::order`]: an undefined
//! field is below every value, so it satisfies `<` and `<=` against any
//! operand, never satisfies `==`, `>`, `>=` or `in`, and always satisfies
//! `!=` and `not in`.

use std::cmp::Ordering;

use serde_json::Value;
use syncstore_core::{Comparison, Filter, PaginationRule, Record};

use crate::order::{compare_fields, values_equal};

fn member_of(field: Option<&Value>, set: &Value) -> bool {
    let Some(value) = field else {
        return false;
    };
    match set {
        Value::Array(items) => items.iter().any(|item| values_equal(value, item)),
        single => values_equal(value, single),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}

/// Evaluate one filter against a record
pub fn matches(record: &Record, filter: &Filter) -> bool {
    let field = record.get(&filter.field);
    let operand = Some(&filter.value);
    match filter.operator {
        Comparison::Eq => field.map_or(false, |v| values_equal(v, &filter.value)),
        Comparison::NotEq => !field.map_or(false, |v| values_equal(v, &filter.value)),
        Comparison::Lt => compare_fields(field, operand) == Ordering::Less,
        Comparison::Lte => compare_fields(field, operand) != Ordering::Greater,
        Comparison::Gt => compare_fields(field, operand) == Ordering::Greater,
        Comparison::Gte => compare_fields(field, operand) != Ordering::Less,
        Comparison::In => member_of(field, &filter.value),
        Comparison::NotIn => !member_of(field, &filter.value),
        Comparison::Has => field.is_some() == truthy(&filter.value),
    }
}

/// AND-combination: true if every filter holds (vacuously true when empty)
pub fn matches_all(record: &Record, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches(record, f))
}

/// OR-combination of rules, each an AND of filters
///
/// An empty rule list places no restriction.
pub fn matches_any_rule(record: &Record, rules: &[PaginationRule]) -> bool {
    rules.is_empty() || rules.iter().any(|rule| matches_all(record, rule.filters()))
}
