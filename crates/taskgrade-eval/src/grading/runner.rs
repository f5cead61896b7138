//! Test Runner: executes a program once per test case and classifies each run.

use serde::{Deserialize, Serialize};
use tracing::debug;

use taskgrade_core::{Program, TestCase};

use super::diff::{diff, CaseDiff};
use crate::interpreter::{run, ExecutionResult, Limits, RuntimeError};

/// Outcome of one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseResult {
    /// The output matched the expected value.
    Passed,
    /// The run completed but its output differs from the expected value.
    Failed { diff: CaseDiff },
    /// The run trapped before completing.
    Errored { error: RuntimeError },
}

impl CaseResult {
    pub fn is_passed(&self) -> bool {
        matches!(self, CaseResult::Passed)
    }
}

/// Runs `program` against every case, in order.
///
/// Cases are independent: each gets a fresh execution state, and a failing
/// or erroring case does not stop the remaining ones from running.
pub fn run_test_cases(program: &Program, cases: &[TestCase], limits: &Limits) -> Vec<CaseResult> {
    cases
        .iter()
        .enumerate()
        .map(|(index, case)| {
            let result = run_case(program, case, limits);
            debug!(case = index, name = case.name.as_deref(), outcome = ?result, "test case finished");
            result
        })
        .collect()
}

fn run_case(program: &Program, case: &TestCase, limits: &Limits) -> CaseResult {
    match run(program, &case.input, limits) {
        ExecutionResult::Completed(output) => {
            let diff = diff(&case.expected, &output.to_json());
            if diff.is_empty() {
                CaseResult::Passed
            } else {
                CaseResult::Failed { diff }
            }
        }
        ExecutionResult::Failed(error) => CaseResult::Errored { error },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as Json};
    use taskgrade_core::{parse_program, parse_test_cases};

    fn identity() -> Program {
        parse_program(&json!({
            "version": 1,
            "commands": [{"op": "emit", "value": "input"}]
        }))
        .unwrap()
    }

    fn cases(doc: Json) -> Vec<TestCase> {
        parse_test_cases(&doc).unwrap()
    }

    #[test]
    fn identity_program_against_different_expected() {
        let results = run_test_cases(
            &identity(),
            &cases(json!([{"input": {"a": 1}, "expected": {"a": 2}}])),
            &Limits::default(),
        );
        match &results[..] {
            [CaseResult::Failed { diff }] => {
                assert_eq!(diff.differences.len(), 1);
                assert_eq!(diff.differences[0].path(), "$.a");
            }
            other => panic!("expected one failed case, got {:?}", other),
        }
    }

    #[test]
    fn results_mirror_case_order_without_short_circuit() {
        let program = parse_program(&json!({
            "version": 1,
            "commands": [{"op": "emit", "value": {"div": [10, "input"]}}]
        }))
        .unwrap();
        let results = run_test_cases(
            &program,
            &cases(json!([
                {"input": 0, "expected": 0},
                {"input": 2, "expected": 5},
                {"input": 5, "expected": 3}
            ])),
            &Limits::default(),
        );
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0],
            CaseResult::Errored {
                error: RuntimeError::DivisionByZero
            }
        );
        assert_eq!(results[1], CaseResult::Passed);
        assert!(matches!(results[2], CaseResult::Failed { .. }));
    }

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_value(CaseResult::Errored {
            error: RuntimeError::StepLimitExceeded { limit: 5 },
        })
        .unwrap();
        assert_eq!(
            json,
            json!({"status": "errored", "error": {"kind": "step_limit_exceeded", "limit": 5}})
        );
    }
}
