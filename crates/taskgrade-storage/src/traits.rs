//! The [`TaskStore`] trait defining the storage contract for users, tasks and
//! grading results.
//!
//! The trait is synchronous: evaluation itself is synchronous and
//! single-threaded, and a backend is owned by one service at a time.

use crate::error::StorageError;
use crate::types::{NewResult, NewTask, NewUser, ResultRecord, Task, TaskId, TaskSummary, User, UserId};

/// The storage contract for the grading service.
///
/// Writers allocate identifiers and timestamps and return the stored record.
/// Backends must enforce reference integrity: a task's author and a result's
/// user and task must exist.
pub trait TaskStore {
    // -------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------

    fn create_user(&mut self, user: NewUser) -> Result<User, StorageError>;

    fn get_user(&self, id: UserId) -> Result<User, StorageError>;

    /// Finds the user linked to an external authentication identity.
    fn find_user_by_auth_id(&self, auth_user_id: &str) -> Result<Option<User>, StorageError>;

    // -------------------------------------------------------------------
    // Tasks
    // -------------------------------------------------------------------

    /// Stores a task.
    ///
    /// Returns [`StorageError::IntegrityError`] when the author does not exist.
    fn create_task(&mut self, task: NewTask) -> Result<Task, StorageError>;

    fn get_task(&self, id: TaskId) -> Result<Task, StorageError>;

    /// Lists published tasks, oldest first.
    fn find_published(&self) -> Result<Vec<TaskSummary>, StorageError>;

    // -------------------------------------------------------------------
    // Results
    // -------------------------------------------------------------------

    /// Records the outcome of a graded submission.
    ///
    /// Returns [`StorageError::IntegrityError`] when the user or task does not
    /// exist.
    fn insert_result(&mut self, result: NewResult) -> Result<ResultRecord, StorageError>;

    /// Results recorded for a task, in insertion order.
    fn results_for_task(&self, task: TaskId) -> Result<Vec<ResultRecord>, StorageError>;

    /// Results recorded for a user, in insertion order.
    fn results_for_user(&self, user: UserId) -> Result<Vec<ResultRecord>, StorageError>;
}
