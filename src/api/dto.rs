//! Data Transfer Objects for API requests and responses.
//!
//! Request fields are optional so that missing values reach the services and
//! are reported as `400` with a specific message instead of a generic
//! deserialization failure.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{Task, TaskId, Timestamp};

// =============================================================================
// Task DTOs
// =============================================================================

/// Request DTO for `POST /tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Task text.
    #[serde(default)]
    pub text: Option<String>,
    /// Assignee names; `null` or absent means none.
    #[serde(default)]
    pub assignees: Option<Vec<String>>,
}

/// Request DTO for `PUT /tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    /// Id of the task to update.
    #[serde(default)]
    pub id: Option<String>,
    /// New completion flag.
    #[serde(default)]
    pub completed: Option<bool>,
}

/// Query parameters for `DELETE /tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteTaskQuery {
    /// Id of the task to delete.
    #[serde(default)]
    pub id: Option<String>,
}

/// Response DTO for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    /// Task ID.
    pub id: String,
    /// Task text.
    pub text: String,
    /// Assignee names.
    pub assignees: Vec<String>,
    /// Completion flag.
    pub completed: bool,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            text: task.text.clone(),
            assignees: task.assignees.clone(),
            completed: task.completed,
            created_at: task.created_at.as_millis(),
        }
    }
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

impl From<TaskResponse> for Task {
    fn from(response: TaskResponse) -> Self {
        Self {
            id: TaskId::from(response.id),
            text: response.text,
            assignees: response.assignees,
            completed: response.completed,
            created_at: Timestamp::from_millis(response.created_at),
        }
    }
}

/// Response DTO for `DELETE /tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTaskResponse {
    /// Always `true` on success.
    pub success: bool,
}

// =============================================================================
// Assignee DTOs
// =============================================================================

/// Request DTO for `POST /assignees`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAssigneeRequest {
    /// Name of the new assignee. Non-string values read as missing.
    #[serde(default, deserialize_with = "string_or_none")]
    pub name: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(name)) => Ok(Some(name)),
        _ => Ok(None),
    }
}

/// Response DTO for `POST /assignees`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeResponse {
    /// Stored (trimmed) name.
    pub name: String,
}

// =============================================================================
// Tests
// =============================================================================
