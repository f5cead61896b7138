//! Storage error types for taskgrade-storage.
//!
//! [`StorageError`] covers lookups of missing rows and reference integrity
//! violations (a task or result pointing at a row that does not exist).

use thiserror::Error;

use crate::types::{TaskId, UserId};

/// Errors produced by storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A task with the given ID was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A user with the given ID was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// A data integrity violation was detected.
    #[error("integrity error: {reason}")]
    IntegrityError { reason: String },
}
