//! Storage-layer types: identifiers, timestamps and row records.
//!
//! The records mirror the `users`, `tasks` and `results` tables. Identifiers
//! are defined here rather than in taskgrade-core because identity is a
//! storage concern: tasks and programs only gain an ID when persisted.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

use taskgrade_core::TaskDefinition;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Allocates a fresh random identifier.
            pub fn new_random() -> Self {
                $name(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a user.
    UserId
);
uuid_id!(
    /// Unique identifier for a task.
    TaskId
);
uuid_id!(
    /// Unique identifier for a stored grading result.
    ResultId
);

impl UserId {
    /// The placeholder author used when a task is created without one.
    pub const PLACEHOLDER: UserId = UserId(Uuid::nil());
}

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Timestamp(millis)
    }
}

/// Role of a user. Stored as a small integer flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Player,
    Admin,
}

impl UserRole {
    pub fn flag(self) -> u8 {
        match self {
            UserRole::Player => 0,
            UserRole::Admin => 1,
        }
    }

    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(UserRole::Player),
            1 => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// A stored user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Identifier from an external authentication provider, if linked.
    pub auth_user_id: Option<String>,
    pub display_name: String,
    pub role: UserRole,
    pub created_at: Timestamp,
}

/// Fields supplied when creating a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub auth_user_id: Option<String>,
    pub display_name: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Player
}

/// A stored task, including its reference program and test cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub dsl_program: Json,
    pub test_cases: Json,
    pub is_published: bool,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    /// The evaluation-relevant part of the task.
    pub fn definition(&self) -> TaskDefinition {
        TaskDefinition {
            dsl_program: self.dsl_program.clone(),
            test_cases: self.test_cases.clone(),
        }
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            is_published: self.is_published,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Fields supplied when creating a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub dsl_program: Json,
    pub test_cases: Json,
    pub is_published: bool,
    pub created_by: UserId,
}

/// Public listing view of a task. Omits the reference program and test cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A stored grading result for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub id: ResultId,
    pub user_id: UserId,
    pub task_id: TaskId,
    pub submitted_program: Json,
    /// 1 for a successful verdict, 0 otherwise.
    pub result_status: u8,
    /// Hex blake3 digest of the canonical submitted program.
    pub program_digest: String,
    pub created_at: Timestamp,
}

/// Fields supplied when recording a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResult {
    pub user_id: UserId,
    pub task_id: TaskId,
    pub submitted_program: Json,
    pub result_status: u8,
    pub program_digest: String,
}
