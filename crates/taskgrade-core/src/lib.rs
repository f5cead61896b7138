//! Core data model for taskgrade: DSL programs, values, and test cases.
//!
//! A task's reference solution and a user's submission are both stored as
//! JSON documents. This crate turns those documents into a closed, validated
//! [`Program`] once, at the boundary, so the interpreter never has to second
//! guess its input.

pub mod error;
pub mod ops;
pub mod parse;
pub mod program;
pub mod task;
pub mod value;

// Re-export commonly used types
pub use error::{ParseError, TestCaseError, ValueError};
pub use ops::{ArithOp, BinaryOp, CmpOp, LogicOp, UnaryOp};
pub use parse::{parse_program, parse_program_with_limits, ParseLimits, INPUT_VARIABLE, PROGRAM_VERSION};
pub use program::{Command, Expr, Program};
pub use task::{parse_test_cases, TaskDefinition, TestCase};
pub use value::{int_equals_float, Value};
