//! TaskService: the single coordinator between callers and the
//! core/eval/storage crates.
//!
//! All use cases flow through [`TaskService`]. The binary is a thin wrapper
//! that reads files, calls these methods and prints the results.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;
use tracing::{info, warn};

use taskgrade_core::TaskDefinition;
use taskgrade_eval::{grade_submission, validate_task_definition, EvalError, EvalOptions, Evaluation, GradedSubmission};
use taskgrade_storage::{
    program_digest, NewResult, NewTask, NewUser, ResultRecord, StorageError, Task, TaskId, TaskStore, TaskSummary,
    User, UserId,
};

/// Maximum title length, in characters.
pub const MAX_TITLE_CHARS: usize = 200;
/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Errors produced by use cases.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request itself is malformed (field lengths, unknown fields).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The task or user does not exist, or the task is not published.
    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Evaluation(#[from] EvalError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Input for creating a task, as submitted by an admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTaskCommand {
    pub title: String,
    pub description: String,
    pub is_published: bool,
    pub dsl_program: Json,
    pub test_cases: Json,
    /// Defaults to the placeholder user when absent.
    #[serde(default)]
    pub created_by_user_id: Option<UserId>,
}

/// The stored result of a submission together with the full evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub record: ResultRecord,
    pub evaluation: Evaluation,
}

/// Use cases over a [`TaskStore`] backend.
pub struct TaskService<S: TaskStore> {
    store: S,
    options: EvalOptions,
}

impl<S: TaskStore> TaskService<S> {
    pub fn new(store: S, options: EvalOptions) -> Self {
        TaskService { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Validates and stores a task.
    ///
    /// Title and description lengths are checked first, then the reference
    /// program must parse and pass every one of its test cases.
    pub fn create_task(&mut self, command: CreateTaskCommand) -> Result<Task, ServiceError> {
        check_length("title", &command.title, MAX_TITLE_CHARS)?;
        check_length("description", &command.description, MAX_DESCRIPTION_CHARS)?;

        let definition = TaskDefinition {
            dsl_program: command.dsl_program,
            test_cases: command.test_cases,
        };
        let validated = validate_task_definition(&definition, &self.options)?;

        let task = self.store.create_task(NewTask {
            title: command.title,
            description: command.description,
            dsl_program: definition.dsl_program,
            test_cases: definition.test_cases,
            is_published: command.is_published,
            created_by: command.created_by_user_id.unwrap_or(UserId::PLACEHOLDER),
        })?;
        info!(task = %task.id, cases = validated.cases.len(), published = task.is_published, "task created");
        Ok(task)
    }

    /// Creates every task in a catalog document (a JSON array of
    /// [`CreateTaskCommand`]s), stopping at the first invalid entry.
    pub fn import_catalog(&mut self, catalog: &Json) -> Result<Vec<Task>, ServiceError> {
        let commands: Vec<CreateTaskCommand> = serde_json::from_value(catalog.clone())
            .map_err(|e| ServiceError::InvalidRequest(format!("invalid catalog: {e}")))?;
        let mut tasks = Vec::with_capacity(commands.len());
        for (index, command) in commands.into_iter().enumerate() {
            let task = self.create_task(command).inspect_err(|error| {
                warn!(index, %error, "catalog entry rejected");
            })?;
            tasks.push(task);
        }
        Ok(tasks)
    }

    pub fn register_user(&mut self, user: NewUser) -> Result<User, ServiceError> {
        Ok(self.store.create_user(user)?)
    }

    pub fn list_published_tasks(&self) -> Result<Vec<TaskSummary>, ServiceError> {
        Ok(self.store.find_published()?)
    }

    pub fn get_task(&self, id: TaskId) -> Result<Task, ServiceError> {
        self.store.get_task(id).map_err(not_found)
    }

    /// Grades a submission against a published task and records the result.
    ///
    /// Submissions that do not parse are rejected without recording a
    /// result. Only the verdict and the program digest are persisted; the
    /// per-case report is returned to the caller.
    pub fn submit_solution(&mut self, task_id: TaskId, user_id: UserId, submitted: Json) -> Result<SubmissionOutcome, ServiceError> {
        let task = self.get_task(task_id)?;
        if !task.is_published {
            return Err(ServiceError::NotFound(format!("task not found: {task_id}")));
        }
        self.store.get_user(user_id).map_err(not_found)?;

        let GradedSubmission { program, evaluation } = grade_submission(&task.definition(), &submitted, &self.options)?;

        let record = self.store.insert_result(NewResult {
            user_id,
            task_id,
            submitted_program: submitted,
            result_status: evaluation.verdict().result_status(),
            program_digest: program_digest(&program),
        })?;
        info!(
            task = %task_id,
            user = %user_id,
            result = %record.id,
            status = record.result_status,
            "submission recorded"
        );
        Ok(SubmissionOutcome { record, evaluation })
    }

    pub fn results_for_task(&self, id: TaskId) -> Result<Vec<ResultRecord>, ServiceError> {
        self.get_task(id)?;
        Ok(self.store.results_for_task(id)?)
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ServiceError> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(ServiceError::InvalidRequest(format!(
            "{field} must be between 1 and {max} characters, got {len}"
        )));
    }
    Ok(())
}

fn not_found(error: StorageError) -> ServiceError {
    match error {
        StorageError::TaskNotFound(_) | StorageError::UserNotFound(_) => ServiceError::NotFound(error.to_string()),
        other => ServiceError::Storage(other),
    }
}
