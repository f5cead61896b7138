//! Structural comparison of an actual output document against the expected one.
//!
//! Lists are compared in order, maps by key set (ignoring key order), and
//! numbers by value so `2` and `2.0` are equal. Differences carry a JSON path
//! such as `$.items[2].name`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json};

use taskgrade_core::int_equals_float;

/// Maximum number of differences recorded for one case.
pub const MAX_DIFFERENCES: usize = 32;

/// One point where the actual output departs from the expected one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Difference {
    /// Both sides have a value at `path` but they differ.
    Changed { path: String, expected: Json, actual: Json },
    /// The expected map key is absent from the actual output.
    Missing { path: String, expected: Json },
    /// The actual output has a map key the expected value lacks.
    Unexpected { path: String, actual: Json },
    /// Lists at `path` differ in length. Common elements are still compared.
    LengthMismatch { path: String, expected: usize, actual: usize },
}

impl Difference {
    pub fn path(&self) -> &str {
        match self {
            Difference::Changed { path, .. }
            | Difference::Missing { path, .. }
            | Difference::Unexpected { path, .. }
            | Difference::LengthMismatch { path, .. } => path,
        }
    }
}

/// The differences found for one failed case, in document order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CaseDiff {
    pub differences: Vec<Difference>,
    /// Set when more than [`MAX_DIFFERENCES`] differences were found.
    pub truncated: bool,
}

impl CaseDiff {
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    fn push(&mut self, difference: Difference) {
        if self.differences.len() < MAX_DIFFERENCES {
            self.differences.push(difference);
        } else {
            self.truncated = true;
        }
    }
}

/// Compares `actual` against `expected`, returning an empty diff when they match.
pub fn diff(expected: &Json, actual: &Json) -> CaseDiff {
    let mut out = CaseDiff::default();
    diff_at("$", expected, actual, &mut out);
    out
}

fn diff_at(path: &str, expected: &Json, actual: &Json, out: &mut CaseDiff) {
    match (expected, actual) {
        (Json::Number(a), Json::Number(b)) => {
            if !numbers_equal(a, b) {
                out.push(changed(path, expected, actual));
            }
        }
        (Json::Array(a), Json::Array(b)) => {
            if a.len() != b.len() {
                out.push(Difference::LengthMismatch {
                    path: path.to_string(),
                    expected: a.len(),
                    actual: b.len(),
                });
            }
            for (index, (x, y)) in a.iter().zip(b).enumerate() {
                diff_at(&format!("{path}[{index}]"), x, y, out);
            }
        }
        (Json::Object(a), Json::Object(b)) => diff_objects(path, a, b, out),
        _ => {
            if expected != actual {
                out.push(changed(path, expected, actual));
            }
        }
    }
}

fn diff_objects(path: &str, expected: &Map<String, Json>, actual: &Map<String, Json>, out: &mut CaseDiff) {
    for (key, value) in expected {
        let child = key_path(path, key);
        match actual.get(key) {
            Some(other) => diff_at(&child, value, other, out),
            None => out.push(Difference::Missing {
                path: child,
                expected: value.clone(),
            }),
        }
    }
    for (key, value) in actual {
        if !expected.contains_key(key) {
            out.push(Difference::Unexpected {
                path: key_path(path, key),
                actual: value.clone(),
            });
        }
    }
}

fn changed(path: &str, expected: &Json, actual: &Json) -> Difference {
    Difference::Changed {
        path: path.to_string(),
        expected: expected.clone(),
        actual: actual.clone(),
    }
}

/// Numbers compare by value without rounding: two integers or two floats
/// compare directly, and an integer equals a float only when the float is
/// integral and holds exactly that integer.
fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (a.is_f64(), b.is_f64()) {
        (false, false) => a == b,
        (true, true) => a.as_f64() == b.as_f64(),
        (false, true) => integer_equals_float(a, b),
        (true, false) => integer_equals_float(b, a),
    }
}

fn integer_equals_float(int: &Number, float: &Number) -> bool {
    let Some(float) = float.as_f64() else {
        return false;
    };
    match (int.as_i64(), int.as_u64()) {
        (Some(i), _) => int_equals_float(i, float),
        // Above i64::MAX: 2^64 is one past u64::MAX.
        (None, Some(u)) => {
            float.fract() == 0.0 && (0.0..18_446_744_073_709_551_616.0).contains(&float) && float as u64 == u
        }
        (None, None) => false,
    }
}

/// Plain identifiers use dot notation, anything else a quoted bracket.
fn key_path(path: &str, key: &str) -> String {
    let plain = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !key.starts_with(|c: char| c.is_ascii_digit());
    if plain {
        format!("{path}.{key}")
    } else {
        // serde_json string escaping gives a valid quoted key.
        format!("{path}[{}]", Json::String(key.to_string()))
    }
}
