//! Execution trace recording for the interpreter.
//!
//! When tracing is enabled via [`super::InterpreterConfig::trace_enabled`], the
//! interpreter records a [`TraceEntry`] for every command dispatch.

use serde::Serialize;

/// A single entry in the execution trace, recording one command dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    /// Step counter value after charging for this dispatch.
    pub step: u64,
    /// The `op` tag of the dispatched command.
    pub op: &'static str,
    /// Variable written by the command, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    /// Value assigned or emitted, as JSON (None for control-flow commands).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}
