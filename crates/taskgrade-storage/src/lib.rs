//! Storage abstraction for users, tasks and grading results.
//!
//! Provides the [`TaskStore`] trait that every backend implements, plus the
//! [`InMemoryStore`] backend used by the CLI and tests.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`types`]: ids, timestamps and the user/task/result records
//! - [`traits`]: TaskStore trait definition
//! - [`memory`]: InMemoryStore implementation
//! - [`hash`]: blake3 digests of canonical programs

pub mod error;
pub mod hash;
pub mod memory;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use hash::program_digest;
pub use memory::InMemoryStore;
pub use traits::TaskStore;
pub use types::{
    NewResult, NewTask, NewUser, ResultId, ResultRecord, Task, TaskId, TaskSummary, Timestamp, User, UserId, UserRole,
};
