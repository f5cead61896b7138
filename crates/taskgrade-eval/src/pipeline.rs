//! End-to-end grading of a submitted program against a task.
//!
//! The pipeline parses the task's reference program and test cases, parses
//! the submission, runs every case and aggregates a verdict. Parse and
//! configuration problems abort with an [`EvalError`]; runtime traps in the
//! submission are reported per case and only affect the verdict.

use serde::Serialize;
use serde_json::Value as Json;
use tracing::{info, warn};

use taskgrade_core::{parse_program_with_limits, parse_test_cases, ParseLimits, Program, TaskDefinition, TestCase};

use crate::error::{ConfigurationError, EvalError};
use crate::grading::{run_test_cases, CaseResult, GradeSummary, Verdict};
use crate::interpreter::Limits;

/// Parse and execution bounds used for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    pub parse_limits: ParseLimits,
    pub limits: Limits,
}

/// Result of one case, with its position and optional label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseReport {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub result: CaseResult,
}

/// Full result of grading one program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub summary: GradeSummary,
    pub cases: Vec<CaseReport>,
}

impl Evaluation {
    pub fn verdict(&self) -> Verdict {
        self.summary.verdict
    }
}

/// A task definition whose reference program and test cases are known good.
#[derive(Debug, Clone)]
pub struct ValidatedTask {
    pub program: Program,
    pub cases: Vec<TestCase>,
}

/// A graded submission together with the program it parsed to.
#[derive(Debug, Clone)]
pub struct GradedSubmission {
    pub program: Program,
    pub evaluation: Evaluation,
}

/// Grades an already parsed program against test cases.
pub fn evaluate_program(program: &Program, cases: &[TestCase], limits: &Limits) -> Result<Evaluation, ConfigurationError> {
    let results = run_test_cases(program, cases, limits);
    let summary = GradeSummary::from_results(&results)?;
    let cases = cases
        .iter()
        .zip(results)
        .enumerate()
        .map(|(index, (case, result))| CaseReport {
            index,
            name: case.name.clone(),
            result,
        })
        .collect();
    Ok(Evaluation { summary, cases })
}

/// Grades `submitted` against the task's test cases.
///
/// The reference program is parsed so a corrupt task is reported as such,
/// but it is not executed here; see [`validate_task_definition`].
///
/// # Errors
///
/// - [`EvalError::ReferenceProgram`] if the stored reference program is invalid
/// - [`EvalError::Configuration`] if the test cases are malformed or empty
/// - [`EvalError::SubmittedProgram`] if the submission does not parse
pub fn evaluate_submission(task: &TaskDefinition, submitted: &Json, options: &EvalOptions) -> Result<Evaluation, EvalError> {
    grade_submission(task, submitted, options).map(|graded| graded.evaluation)
}

/// Like [`evaluate_submission`], but also hands back the parsed submission
/// so callers can fingerprint it without parsing it again.
pub fn grade_submission(task: &TaskDefinition, submitted: &Json, options: &EvalOptions) -> Result<GradedSubmission, EvalError> {
    parse_program_with_limits(&task.dsl_program, &options.parse_limits).map_err(EvalError::ReferenceProgram)?;
    let cases = load_cases(&task.test_cases)?;
    let program = parse_program_with_limits(submitted, &options.parse_limits).map_err(EvalError::SubmittedProgram)?;

    let evaluation = evaluate_program(&program, &cases, &options.limits)?;
    info!(
        verdict = ?evaluation.summary.verdict,
        passed = evaluation.summary.passed,
        failed = evaluation.summary.failed,
        errored = evaluation.summary.errored,
        "submission evaluated"
    );
    Ok(GradedSubmission { program, evaluation })
}

/// Checks that a task definition can be used for grading.
///
/// Parses the reference program and test cases, then runs the reference
/// program against its own cases. A reference that does not pass every case
/// is rejected with [`EvalError::ReferenceFailed`].
pub fn validate_task_definition(task: &TaskDefinition, options: &EvalOptions) -> Result<ValidatedTask, EvalError> {
    let program = parse_program_with_limits(&task.dsl_program, &options.parse_limits).map_err(EvalError::ReferenceProgram)?;
    let cases = load_cases(&task.test_cases)?;

    let evaluation = evaluate_program(&program, &cases, &options.limits)?;
    if evaluation.verdict() != Verdict::Success {
        warn!(
            passed = evaluation.summary.passed,
            total = evaluation.summary.total,
            "reference program fails its own test cases"
        );
        return Err(EvalError::ReferenceFailed {
            summary: evaluation.summary,
        });
    }

    Ok(ValidatedTask { program, cases })
}

fn load_cases(doc: &Json) -> Result<Vec<TestCase>, ConfigurationError> {
    let cases = parse_test_cases(doc).inspect_err(|error| warn!(%error, "task test cases are malformed"))?;
    if cases.is_empty() {
        warn!("task has no test cases");
        return Err(ConfigurationError::NoTestCases);
    }
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskgrade_core::ParseError;

    fn task(program: Json, cases: Json) -> TaskDefinition {
        TaskDefinition {
            dsl_program: program,
            test_cases: cases,
        }
    }

    fn doubling() -> Json {
        json!({"version": 1, "commands": [{"op": "emit", "value": {"mul": ["input", 2]}}]})
    }

    #[test]
    fn correct_submission_succeeds() {
        let task = task(
            doubling(),
            json!([{"input": 1, "expected": 2}, {"input": 5, "expected": 10}]),
        );
        let submitted = json!({"version": 1, "commands": [{"op": "emit", "value": {"add": ["input", "input"]}}]});
        let evaluation = evaluate_submission(&task, &submitted, &EvalOptions::default()).unwrap();
        assert_eq!(evaluation.verdict(), Verdict::Success);
        assert_eq!(evaluation.cases.len(), 2);
        assert_eq!(evaluation.summary.passed, 2);
    }

    #[test]
    fn partially_correct_submission_fails() {
        let task = task(
            doubling(),
            json!([{"input": 2, "expected": 4}, {"input": 3, "expected": 6}]),
        );
        let submitted = json!({"version": 1, "commands": [{"op": "emit", "value": 4}]});
        let evaluation = evaluate_submission(&task, &submitted, &EvalOptions::default()).unwrap();
        assert_eq!(evaluation.verdict(), Verdict::Failure);
        assert!(evaluation.cases[0].result.is_passed());
        assert!(!evaluation.cases[1].result.is_passed());
    }

    #[test]
    fn empty_test_cases_are_a_configuration_error() {
        let err = evaluate_submission(&task(doubling(), json!([])), &doubling(), &EvalOptions::default()).unwrap_err();
        assert_eq!(err, EvalError::Configuration(ConfigurationError::NoTestCases));
        assert!(err.is_task_problem());
    }

    #[test]
    fn invalid_submission_is_reported_separately() {
        let task = task(doubling(), json!([{"input": 1, "expected": 2}]));
        let err = evaluate_submission(&task, &json!({"version": 2, "commands": []}), &EvalOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::SubmittedProgram(ParseError::UnsupportedVersion { found: "2".into() })
        );
        assert!(!err.is_task_problem());
    }

    #[test]
    fn corrupt_reference_program_is_reported() {
        let task = task(json!({"commands": []}), json!([{"input": 1, "expected": 2}]));
        let err = evaluate_submission(&task, &doubling(), &EvalOptions::default()).unwrap_err();
        assert!(matches!(err, EvalError::ReferenceProgram(ParseError::MalformedDocument { .. })));
    }

    #[test]
    fn graded_submission_keeps_the_parsed_program() {
        let task = task(doubling(), json!([{"input": 4, "expected": 8}]));
        let graded = grade_submission(&task, &doubling(), &EvalOptions::default()).unwrap();
        assert_eq!(graded.program, taskgrade_core::parse_program(&doubling()).unwrap());
        assert_eq!(graded.evaluation.verdict(), Verdict::Success);
    }

    #[test]
    fn validation_runs_the_reference_program() {
        let good = task(doubling(), json!([{"name": "one", "input": 1, "expected": 2}]));
        let validated = validate_task_definition(&good, &EvalOptions::default()).unwrap();
        assert_eq!(validated.cases.len(), 1);

        let bad = task(doubling(), json!([{"input": 1, "expected": 3}]));
        match validate_task_definition(&bad, &EvalOptions::default()).unwrap_err() {
            EvalError::ReferenceFailed { summary } => {
                assert_eq!(summary.total, 1);
                assert_eq!(summary.passed, 0);
            }
            other => panic!("expected ReferenceFailed, got {:?}", other),
        }
    }

    #[test]
    fn case_reports_keep_names() {
        let program = taskgrade_core::parse_program(&doubling()).unwrap();
        let cases = parse_test_cases(&json!([{"name": "first", "input": 1, "expected": 2}])).unwrap();
        let evaluation = evaluate_program(&program, &cases, &Limits::default()).unwrap();
        assert_eq!(evaluation.cases[0].name.as_deref(), Some("first"));
        assert_eq!(evaluation.cases[0].index, 0);
    }
}
