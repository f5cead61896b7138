//! Runtime error types with trap semantics for the interpreter.
//!
//! Every variant halts the run. The test runner turns them into an `Errored`
//! case result, so a failing case never aborts grading of the others.

use serde::{Deserialize, Serialize};

/// Runtime errors produced by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuntimeError {
    #[error("step limit of {limit} exceeded")]
    StepLimitExceeded { limit: u64 },

    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String },

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("numeric overflow in '{operation}'")]
    NumericOverflow { operation: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("missing key '{key}'")]
    MissingKey { key: String },

    #[error("output exceeds the size limit of {limit}")]
    OutputTooLarge { limit: usize },

    #[error("value exceeds the size limit of {limit}")]
    ValueTooLarge { limit: usize },

    #[error("value exceeds the nesting limit of {limit}")]
    ValueTooDeep { limit: usize },
}

impl RuntimeError {
    pub(crate) fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        RuntimeError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
