//! Verdict Aggregator: folds per-case results into a pass/fail verdict.

use serde::{Deserialize, Serialize};

use super::runner::CaseResult;
use crate::error::ConfigurationError;

/// Overall outcome of a graded submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Success,
    Failure,
}

impl Verdict {
    /// The persisted `resultStatus` flag: 1 for success, 0 for failure.
    pub fn result_status(self) -> u8 {
        match self {
            Verdict::Success => 1,
            Verdict::Failure => 0,
        }
    }

    pub fn from_result_status(status: u8) -> Option<Self> {
        match status {
            1 => Some(Verdict::Success),
            0 => Some(Verdict::Failure),
            _ => None,
        }
    }
}

/// `Success` iff there is at least one case and every case passed.
///
/// # Errors
///
/// Returns [`ConfigurationError::NoTestCases`] for an empty slice: a task
/// without test cases is misconfigured rather than trivially passed.
pub fn aggregate(results: &[CaseResult]) -> Result<Verdict, ConfigurationError> {
    if results.is_empty() {
        return Err(ConfigurationError::NoTestCases);
    }
    if results.iter().all(CaseResult::is_passed) {
        Ok(Verdict::Success)
    } else {
        Ok(Verdict::Failure)
    }
}

/// Counts of each case outcome, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeSummary {
    pub verdict: Verdict,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl GradeSummary {
    pub fn from_results(results: &[CaseResult]) -> Result<Self, ConfigurationError> {
        let verdict = aggregate(results)?;
        let mut summary = GradeSummary {
            verdict,
            total: results.len(),
            passed: 0,
            failed: 0,
            errored: 0,
        };
        for result in results {
            match result {
                CaseResult::Passed => summary.passed += 1,
                CaseResult::Failed { .. } => summary.failed += 1,
                CaseResult::Errored { .. } => summary.errored += 1,
            }
        }
        Ok(summary)
    }
}
