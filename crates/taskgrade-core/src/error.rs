//! Error types for taskgrade-core.
//!
//! Uses `thiserror` for structured, matchable variants. [`ParseError`] covers
//! every way a stored or submitted program document can be rejected;
//! [`TestCaseError`] covers malformed `testCases` documents.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while turning a JSON document into a [`crate::Program`].
///
/// These indicate bad stored or submitted data, never an engine bug, and are
/// surfaced verbatim to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    /// The document is not an object, or lacks `version` / `commands`.
    #[error("malformed program document: {reason}")]
    MalformedDocument { reason: String },

    /// The `version` field holds a value other than a supported version.
    #[error("unsupported program version: {found}")]
    UnsupportedVersion { found: String },

    /// A command did not match any known shape.
    ///
    /// `index` is the position in the top-level `commands` array; `reason`
    /// names the nested location when the offending command is inside a body.
    #[error("invalid command at index {index}: {reason}")]
    InvalidCommand { index: usize, reason: String },

    /// The program holds more commands (nested ones included) than allowed.
    #[error("program exceeds the maximum of {limit} commands")]
    ProgramTooLarge { limit: usize },

    /// Control-flow commands are nested deeper than allowed.
    #[error("program exceeds the maximum nesting depth of {limit}")]
    ProgramTooDeep { limit: usize },
}

/// Errors produced while reading a task's `testCases` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestCaseError {
    #[error("test cases must be a JSON array, got {found}")]
    NotAnArray { found: String },

    #[error("test case {index}: {reason}")]
    InvalidCase { index: usize, reason: String },
}

/// A JSON value that cannot be represented as a runtime [`crate::Value`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Integers must fit in `i64`.
    #[error("number {0} is outside the supported integer range")]
    NumberOutOfRange(String),
}
