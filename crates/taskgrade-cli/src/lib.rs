//! Use cases and configuration behind the `taskgrade` binary.
//!
//! - [`config`]: limits and log level read from `TASKGRADE_*` environment variables
//! - [`service`]: [`TaskService`], the coordinator between callers, the
//!   evaluation pipeline and a [`TaskStore`](taskgrade_storage::TaskStore)

pub mod config;
pub mod service;

pub use config::{Config, ConfigError};
pub use service::{CreateTaskCommand, ServiceError, SubmissionOutcome, TaskService};
