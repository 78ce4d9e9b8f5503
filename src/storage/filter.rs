//! In-process predicate evaluation over [`Row`]s.
//!
//! Clauses group the way SQL precedence does: `AND` binds tighter than `OR`, so
//! `a OR b AND c` reads as `a OR (b AND c)`. Comparisons against `NULL` (or a
//! missing column) are never true, except through `IS NULL`.

use crate::query::table::{Clause, Connective, Operator, Predicate};
use crate::storage::Row;
use serde_json::Value;
use std::cmp::Ordering;

/// Does `row` satisfy the clause list?
pub fn matches(row: &Row, clauses: &[Clause]) -> bool {
    if clauses.is_empty() {
        return true;
    }

    let mut any_group = false;
    let mut group = true;
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 && clause.connective == Connective::Or {
            any_group |= group;
            group = true;
        }
        group = group && evaluate(row, &clause.predicate);
    }
    any_group || group
}

/// Evaluate a single predicate against a row.
pub fn evaluate(row: &Row, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Compare { column, op, value } => compare(field(row, column), *op, value),
        Predicate::In {
            column,
            values,
            negated,
        } => {
            let actual = field(row, column);
            if actual.is_null() {
                return false;
            }
            let found = values.iter().any(|v| values_equal(actual, v));
            found != *negated
        }
        Predicate::Between {
            column,
            low,
            high,
            negated,
        } => {
            let actual = field(row, column);
            let inside = matches!(
                compare_values(actual, low),
                Some(Ordering::Greater | Ordering::Equal)
            ) && matches!(
                compare_values(actual, high),
                Some(Ordering::Less | Ordering::Equal)
            );
            if actual.is_null() {
                return false;
            }
            inside != *negated
        }
        Predicate::Null { column, negated } => field(row, column).is_null() != *negated,
    }
}

/// Compare a row value against an operand.
pub fn compare(actual: &Value, op: Operator, expected: &Value) -> bool {
    if actual.is_null() || expected.is_null() {
        return false;
    }
    match op {
        Operator::Eq => values_equal(actual, expected),
        Operator::Ne => !values_equal(actual, expected),
        Operator::Gt => compare_values(actual, expected) == Some(Ordering::Greater),
        Operator::Gte => matches!(
            compare_values(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Lt => compare_values(actual, expected) == Some(Ordering::Less),
        Operator::Lte => matches!(
            compare_values(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Like => like(actual, expected, false),
        Operator::ILike => like(actual, expected, true),
        Operator::NotLike => !like(actual, expected, false),
    }
}

fn field<'a>(row: &'a Row, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&Value::Null)
}

fn like(actual: &Value, pattern: &Value, case_insensitive: bool) -> bool {
    let (Some(text), Some(pattern)) = (actual.as_str(), pattern.as_str()) else {
        return false;
    };
    if case_insensitive {
        like_match(&text.to_lowercase(), &pattern.to_lowercase())
    } else {
        like_match(text, pattern)
    }
}

/// Equality with numeric coercion: `1` equals `1.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Ordering between two values of compatible types.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Total ordering used for sorting: nulls first, then by value.
pub fn sort_order(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => compare_values(a, b).unwrap_or(Ordering::Equal),
    }
}

/// SQL `LIKE`: `%` matches any run of characters, `_` exactly one.
///
/// Greedy two-pointer scan: on a mismatch, backtrack to the last `%` and let
/// it absorb one more character. Linear in the common case, `O(n * m)` worst.
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '_' || c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match star {
                Some((star_p, star_t)) => {
                    star = Some((star_p, star_t + 1));
                    p = star_p + 1;
                    t = star_t + 1;
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}
