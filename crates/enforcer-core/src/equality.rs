//! # Deep Equality
//!
//! Structural equality over [`Value`], used by `enum` membership and
//! `uniqueItems`. Numbers compare by numeric value regardless of whether
//! they are stored as `Integer` or `Number`; everything else compares
//! only against the same variant.

use crate::value::Value;

/// Structural equality of two values.
///
/// Arrays are equal when they have the same length and pairwise-equal
/// items; objects when they have the same key set and equal values per
/// key. Key order never matters.
pub fn same(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Integer(_) | Value::Number(_), Value::Integer(_) | Value::Number(_)) => {
            a.as_f64() == b.as_f64()
        }
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        (Value::Date(x), Value::Date(y)) => x == y,
        (Value::DateTime(x), Value::DateTime(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| same(p, q))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, p)| y.get(key).is_some_and(|q| same(p, q)))
        }
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        same(self, other)
    }
}

/// Whether `needle` is structurally equal to any member of `haystack`.
pub fn contains(haystack: &[Value], needle: &Value) -> bool {
    haystack.iter().any(|candidate| same(candidate, needle))
}

/// Index of the first item that equals an earlier item, if any.
pub fn first_duplicate(items: &[Value]) -> Option<usize> {
    (1..items.len()).find(|&i| contains(&items[..i], &items[i]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(j: serde_json::Value) -> Value {
        Value::from(j)
    }

    #[test]
    fn test_objects_ignore_key_order() {
        assert!(same(&v(json!({"a": 1, "b": 2})), &v(json!({"b": 2, "a": 1}))));
    }

    #[test]
    fn test_objects_with_extra_key_differ() {
        assert!(!same(&v(json!({"a": 1})), &v(json!({"a": 1, "b": 2}))));
    }

    #[test]
    fn test_arrays_compare_positionally() {
        assert!(same(&v(json!([1, [2, 3]])), &v(json!([1, [2, 3]]))));
        assert!(!same(&v(json!([1, 2])), &v(json!([2, 1]))));
        assert!(!same(&v(json!([1])), &v(json!([1, 1]))));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(same(&Value::Integer(1), &Value::Number(1.0)));
        assert!(!same(&Value::Integer(1), &Value::from("1")));
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert!(!same(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
    }

    #[test]
    fn test_first_duplicate() {
        let items = match v(json!([{"a": 1}, 2, {"a": 1}, 2])) {
            Value::Array(items) => items,
            _ => unreachable!(),
        };
        assert_eq!(first_duplicate(&items), Some(2));
        assert_eq!(first_duplicate(&items[..2]), None);
    }
}
