//! In-memory implementation of [`TaskStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests, the CLI, and anywhere
//! persistence isn't needed. Rows live in insertion-ordered maps so listings
//! are stable without a separate sort key.

use indexmap::IndexMap;

use crate::error::StorageError;
use crate::traits::TaskStore;
use crate::types::{
    NewResult, NewTask, NewUser, ResultId, ResultRecord, Task, TaskId, TaskSummary, Timestamp, User, UserId, UserRole,
};

/// Backend that keeps every row in memory.
///
/// A new store already contains the placeholder user
/// ([`UserId::PLACEHOLDER`]) so tasks created without an author satisfy
/// reference integrity.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    users: IndexMap<UserId, User>,
    tasks: IndexMap<TaskId, Task>,
    results: IndexMap<ResultId, ResultRecord>,
}

impl InMemoryStore {
    /// Creates a store holding only the placeholder user.
    pub fn new() -> Self {
        let mut users = IndexMap::new();
        users.insert(
            UserId::PLACEHOLDER,
            User {
                id: UserId::PLACEHOLDER,
                auth_user_id: None,
                display_name: "placeholder".to_string(),
                role: UserRole::Admin,
                created_at: Timestamp(0),
            },
        );
        InMemoryStore {
            users,
            tasks: IndexMap::new(),
            results: IndexMap::new(),
        }
    }

    /// Sets a task's published flag, bumping its `updated_at`.
    pub fn set_published(&mut self, id: TaskId, published: bool) -> Result<(), StorageError> {
        let task = self.tasks.get_mut(&id).ok_or(StorageError::TaskNotFound(id))?;
        task.is_published = published;
        task.updated_at = Timestamp::now();
        Ok(())
    }

    fn require_user(&self, id: UserId, context: &str) -> Result<(), StorageError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::IntegrityError {
                reason: format!("{context} references unknown user {id}"),
            })
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore for InMemoryStore {
    // -------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------

    fn create_user(&mut self, user: NewUser) -> Result<User, StorageError> {
        if let Some(auth_id) = &user.auth_user_id {
            if self.find_user_by_auth_id(auth_id)?.is_some() {
                return Err(StorageError::IntegrityError {
                    reason: format!("auth user id '{auth_id}' is already linked"),
                });
            }
        }
        let stored = User {
            id: UserId::new_random(),
            auth_user_id: user.auth_user_id,
            display_name: user.display_name,
            role: user.role,
            created_at: Timestamp::now(),
        };
        self.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn get_user(&self, id: UserId) -> Result<User, StorageError> {
        self.users.get(&id).cloned().ok_or(StorageError::UserNotFound(id))
    }

    fn find_user_by_auth_id(&self, auth_user_id: &str) -> Result<Option<User>, StorageError> {
        Ok(self
            .users
            .values()
            .find(|user| user.auth_user_id.as_deref() == Some(auth_user_id))
            .cloned())
    }

    // -------------------------------------------------------------------
    // Tasks
    // -------------------------------------------------------------------

    fn create_task(&mut self, task: NewTask) -> Result<Task, StorageError> {
        self.require_user(task.created_by, "task")?;
        let now = Timestamp::now();
        let stored = Task {
            id: TaskId::new_random(),
            title: task.title,
            description: task.description,
            dsl_program: task.dsl_program,
            test_cases: task.test_cases,
            is_published: task.is_published,
            created_by: task.created_by,
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn get_task(&self, id: TaskId) -> Result<Task, StorageError> {
        self.tasks.get(&id).cloned().ok_or(StorageError::TaskNotFound(id))
    }

    fn find_published(&self) -> Result<Vec<TaskSummary>, StorageError> {
        Ok(self
            .tasks
            .values()
            .filter(|task| task.is_published)
            .map(Task::summary)
            .collect())
    }

    // -------------------------------------------------------------------
    // Results
    // -------------------------------------------------------------------

    fn insert_result(&mut self, result: NewResult) -> Result<ResultRecord, StorageError> {
        self.require_user(result.user_id, "result")?;
        if !self.tasks.contains_key(&result.task_id) {
            return Err(StorageError::IntegrityError {
                reason: format!("result references unknown task {}", result.task_id),
            });
        }
        if result.result_status > 1 {
            return Err(StorageError::IntegrityError {
                reason: format!("result status must be 0 or 1, got {}", result.result_status),
            });
        }
        let stored = ResultRecord {
            id: ResultId::new_random(),
            user_id: result.user_id,
            task_id: result.task_id,
            submitted_program: result.submitted_program,
            result_status: result.result_status,
            program_digest: result.program_digest,
            created_at: Timestamp::now(),
        };
        self.results.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn results_for_task(&self, task: TaskId) -> Result<Vec<ResultRecord>, StorageError> {
        Ok(self
            .results
            .values()
            .filter(|result| result.task_id == task)
            .cloned()
            .collect())
    }

    fn results_for_user(&self, user: UserId) -> Result<Vec<ResultRecord>, StorageError> {
        Ok(self
            .results
            .values()
            .filter(|result| result.user_id == user)
            .cloned()
            .collect())
    }
}
