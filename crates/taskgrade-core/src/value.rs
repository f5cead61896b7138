//! Runtime value representation shared by program literals, interpreter
//! state, and program output.
//!
//! [`Value`] is a closed counterpart of JSON: integers and floats are kept
//! apart so arithmetic can use fixed-width checked semantics, and maps keep
//! insertion order via [`IndexMap`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// A value manipulated by DSL programs.
///
/// Note: `Float` is always finite. The interpreter reports `NumericOverflow`
/// instead of producing NaN or infinity, and JSON cannot encode either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Converts a JSON value into a [`Value`].
    ///
    /// Integers that do not fit in `i64` are rejected rather than silently
    /// widened to floats.
    pub fn from_json(json: &serde_json::Value) -> Result<Value, ValueError> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if n.is_u64() {
                    return Err(ValueError::NumberOutOfRange(n.to_string()));
                } else {
                    match n.as_f64() {
                        Some(f) if f.is_finite() => Value::Float(f),
                        _ => return Err(ValueError::NumberOutOfRange(n.to_string())),
                    }
                }
            }
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => Value::List(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            serde_json::Value::Object(map) => {
                let mut entries = IndexMap::with_capacity(map.len());
                for (key, item) in map {
                    entries.insert(key.clone(), Value::from_json(item)?);
                }
                Value::Map(entries)
            }
        })
    }

    /// Converts this value back to JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            // Non-finite floats never reach here; map them to null just in case.
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, item)| (key.clone(), item.to_json()))
                    .collect(),
            ),
        }
    }

    /// Returns a human-readable name of the value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Approximate memory weight used for size limits.
    ///
    /// Scalars weigh 1, strings weigh 1 plus their byte length, containers
    /// weigh 1 plus the weight of their contents (map keys included).
    pub fn weight(&self) -> usize {
        match self {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => 1,
            Value::Str(s) => 1 + s.len(),
            Value::List(items) => 1 + items.iter().map(Value::weight).sum::<usize>(),
            Value::Map(entries) => {
                1 + entries
                    .iter()
                    .map(|(key, item)| key.len() + item.weight())
                    .sum::<usize>()
            }
        }
    }

    /// Nesting depth: scalars and strings are 0, a container is one more
    /// than its deepest element.
    pub fn depth(&self) -> usize {
        match self {
            Value::List(items) => 1 + items.iter().map(Value::depth).max().unwrap_or(0),
            Value::Map(entries) => 1 + entries.values().map(Value::depth).max().unwrap_or(0),
            _ => 0,
        }
    }

    /// Structural equality where integers and floats compare by numeric value.
    ///
    /// Lists compare element-wise in order; maps compare by key set and the
    /// value under each key, ignoring insertion order.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                int_equals_float(*a, *b)
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .all(|(key, x)| b.get(key).is_some_and(|y| x.loosely_equals(y)))
            }
            _ => self == other,
        }
    }
}

/// Exact comparison of an integer with a float.
///
/// The float must be integral and inside the `i64` range; casting the integer
/// to `f64` instead would round large values.
pub fn int_equals_float(int: i64, float: f64) -> bool {
    // -2^63 is i64::MIN; 2^63 is one past i64::MAX.
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    float.fract() == 0.0 && (LOWER..UPPER).contains(&float) && float as i64 == int
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_keeps_ints_and_floats_apart() {
        assert_eq!(Value::from_json(&json!(2)).unwrap(), Value::Int(2));
        assert_eq!(Value::from_json(&json!(2.5)).unwrap(), Value::Float(2.5));
        assert_eq!(Value::from_json(&json!(-7)).unwrap(), Value::Int(-7));
    }

    #[test]
    fn from_json_rejects_u64_beyond_i64() {
        let err = Value::from_json(&json!(u64::MAX)).unwrap_err();
        assert!(matches!(err, ValueError::NumberOutOfRange(_)));
    }

    #[test]
    fn nested_map_converts_back_to_json() {
        let value = Value::from_json(&json!({"b": 1, "a": [true, null, "x"]})).unwrap();
        match &value {
            Value::Map(entries) => assert_eq!(entries.len(), 2),
            other => panic!("expected map, got {:?}", other),
        }
        assert_eq!(value.to_json(), json!({"a": [true, null, "x"], "b": 1}));
    }

    #[test]
    fn weight_accounts_for_nested_content() {
        assert_eq!(Value::Int(5).weight(), 1);
        assert_eq!(Value::Str("abc".into()).weight(), 4);
        let list = Value::List(vec![Value::Int(1), Value::Str("ab".into())]);
        assert_eq!(list.weight(), 1 + 1 + 3);
        let map = Value::from_json(&json!({"k": 1})).unwrap();
        assert_eq!(map.weight(), 1 + 1 + 1);
    }

    #[test]
    fn loose_equality_compares_numbers_by_value() {
        assert!(Value::Int(2).loosely_equals(&Value::Float(2.0)));
        assert!(!Value::Int(2).loosely_equals(&Value::Float(2.5)));
        assert!(!Value::Int(1).loosely_equals(&Value::Bool(true)));

        let a = Value::from_json(&json!({"x": 1, "y": [1, 2]})).unwrap();
        let b = Value::from_json(&json!({"y": [1.0, 2], "x": 1})).unwrap();
        assert!(a.loosely_equals(&b));

        let reordered = Value::from_json(&json!([2, 1])).unwrap();
        let ordered = Value::from_json(&json!([1, 2])).unwrap();
        assert!(!reordered.loosely_equals(&ordered));
    }

    #[test]
    fn large_ints_do_not_round_to_equal_floats() {
        assert!(!Value::Int(i64::MAX).loosely_equals(&Value::Float(9.223372036854776e18)));
        assert!(!Value::Int(9_007_199_254_740_993).loosely_equals(&Value::Float(9_007_199_254_740_992.0)));
        assert!(Value::Int(9_007_199_254_740_992).loosely_equals(&Value::Float(9_007_199_254_740_992.0)));
        assert!(Value::Int(i64::MIN).loosely_equals(&Value::Float(-9.223372036854775808e18)));
        assert!(!int_equals_float(3, 3.5));
    }

    #[test]
    fn depth_counts_container_nesting() {
        assert_eq!(Value::Int(1).depth(), 0);
        assert_eq!(Value::from_json(&json!([])).unwrap().depth(), 1);
        assert_eq!(Value::from_json(&json!({"a": [[1], 2]})).unwrap().depth(), 3);
    }
}
