//! Task-level documents: the stored reference program and test cases.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::TestCaseError;
use crate::parse::json_kind;

/// The evaluation-relevant part of a task record, as the persistence layer
/// stores it (`dslProgram` / `testCases` JSON columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub dsl_program: Json,
    pub test_cases: Json,
}

/// One input/expected-output pair used to grade a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Optional label shown in reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub input: Json,
    pub expected: Json,
}

/// Reads a `testCases` document: an array of `{input, expected}` objects with
/// an optional `name`.
///
/// An empty array is accepted here; whether zero cases is acceptable is
/// decided by the verdict aggregator.
pub fn parse_test_cases(doc: &Json) -> Result<Vec<TestCase>, TestCaseError> {
    let items = doc.as_array().ok_or_else(|| TestCaseError::NotAnArray {
        found: json_kind(doc).to_string(),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let object = item.as_object().ok_or_else(|| TestCaseError::InvalidCase {
                index,
                reason: "expected an object with 'input' and 'expected'".into(),
            })?;
            for key in object.keys() {
                if !matches!(key.as_str(), "name" | "input" | "expected") {
                    return Err(TestCaseError::InvalidCase {
                        index,
                        reason: format!("unexpected field '{key}'"),
                    });
                }
            }
            let field = |name: &str| {
                object.get(name).cloned().ok_or_else(|| TestCaseError::InvalidCase {
                    index,
                    reason: format!("missing '{name}'"),
                })
            };
            let name = match object.get("name") {
                None | Some(Json::Null) => None,
                Some(Json::String(name)) => Some(name.clone()),
                Some(_) => {
                    return Err(TestCaseError::InvalidCase {
                        index,
                        reason: "'name' must be a string".into(),
                    })
                }
            };
            Ok(TestCase {
                name,
                input: field("input")?,
                expected: field("expected")?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_cases_in_order() {
        let cases = parse_test_cases(&json!([
            {"input": {"a": 1}, "expected": 1},
            {"name": "second", "input": [], "expected": null}
        ]))
        .unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].input, json!({"a": 1}));
        assert_eq!(cases[0].name, None);
        assert_eq!(cases[1].name.as_deref(), Some("second"));
        assert_eq!(cases[1].expected, Json::Null);
    }

    #[test]
    fn empty_array_is_not_an_error_here() {
        assert!(parse_test_cases(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn rejects_non_arrays_and_bad_cases() {
        assert_eq!(
            parse_test_cases(&json!({"input": 1})).unwrap_err(),
            TestCaseError::NotAnArray {
                found: "object".into()
            }
        );
        assert!(matches!(
            parse_test_cases(&json!([{"input": 1}])).unwrap_err(),
            TestCaseError::InvalidCase { index: 0, .. }
        ));
        assert!(matches!(
            parse_test_cases(&json!([{"input": 1, "expected": 1}, {"input": 1, "expected": 2, "weight": 3}]))
                .unwrap_err(),
            TestCaseError::InvalidCase { index: 1, .. }
        ));
    }

    #[test]
    fn task_definition_uses_camel_case() {
        let def: TaskDefinition = serde_json::from_value(json!({
            "dslProgram": {"version": 1, "commands": []},
            "testCases": []
        }))
        .unwrap();
        assert_eq!(def.test_cases, json!([]));
    }
}
