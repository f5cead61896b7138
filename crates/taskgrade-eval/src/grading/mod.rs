//! Grading: per-case execution, structural diffing, and verdict aggregation.

pub mod diff;
pub mod runner;
pub mod verdict;

pub use diff::{diff, CaseDiff, Difference, MAX_DIFFERENCES};
pub use runner::{run_test_cases, CaseResult};
pub use verdict::{aggregate, GradeSummary, Verdict};
