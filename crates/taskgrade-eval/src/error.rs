//! Error types for taskgrade-eval.
//!
//! [`ConfigurationError`] means the task itself cannot be graded. [`EvalError`]
//! is what the evaluation pipeline returns when grading cannot produce a
//! verdict at all. Runtime traps are not errors at this level: they become
//! `Errored` case results.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use taskgrade_core::{ParseError, TestCaseError};

use crate::grading::GradeSummary;

/// The task's test cases cannot be used for grading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigurationError {
    /// The task defines zero test cases.
    #[error("task has no test cases")]
    NoTestCases,

    /// The `testCases` document is malformed.
    #[error("invalid test cases: {source}")]
    InvalidTestCases {
        #[from]
        source: TestCaseError,
    },
}

/// Errors produced by the evaluation pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The task's stored reference program does not parse.
    #[error("reference program is invalid: {0}")]
    ReferenceProgram(ParseError),

    /// The submitted program does not parse.
    #[error("submitted program is invalid: {0}")]
    SubmittedProgram(ParseError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The reference program does not pass its own test cases.
    #[error("reference program fails its own test cases ({} of {} passed)", summary.passed, summary.total)]
    ReferenceFailed { summary: GradeSummary },
}

impl EvalError {
    /// True when the failure lies with the task rather than the submission.
    pub fn is_task_problem(&self) -> bool {
        !matches!(self, EvalError::SubmittedProgram(_))
    }
}
