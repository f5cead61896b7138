//! Evaluation of DSL programs against task test cases.
//!
//! - [`interpreter`]: the sandboxed Execution Engine.
//! - [`grading`]: the Test Runner, structural diff, and Verdict Aggregator.
//! - [`pipeline`]: end-to-end grading of a submission against a task.

pub mod error;
pub mod grading;
pub mod interpreter;
pub mod pipeline;

pub use error::{ConfigurationError, EvalError};
pub use grading::{aggregate, run_test_cases, CaseDiff, CaseResult, Difference, GradeSummary, Verdict};
pub use interpreter::{run, ExecutionResult, Interpreter, InterpreterConfig, Limits, Output, RuntimeError};
pub use pipeline::{
    evaluate_program, evaluate_submission, grade_submission, validate_task_definition, CaseReport, EvalOptions, Evaluation,
    GradedSubmission, ValidatedTask,
};
