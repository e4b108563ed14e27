//! Persistence contract shared by every backend.
//!
//! Methods return boxed futures so the trait stays object-safe and backends
//! can be selected at runtime behind `Arc<dyn Store>`.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{Assignee, NewTask, Task, TaskId};

// =============================================================================
// Store Error
// =============================================================================

/// Errors that can occur during store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Referenced record does not exist.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// A unique key is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backing file or database could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Future returned by every `Store` method.
pub type StoreFuture<T> = BoxFuture<'static, Result<T, StoreError>>;

// =============================================================================
// Store
// =============================================================================

/// Durable keeper of task and assignee records.
///
/// Every implementation guarantees:
///
/// - `list_tasks` is ordered by `created_at` descending, ties newest insertion first.
/// - `create_task` is atomic: a failed call leaves nothing visible to later reads.
/// - `update_task_completion` touches nothing but `completed`.
/// - `delete_task` is idempotent.
/// - `list_assignees` is ordered by name ascending.
/// - No two assignees share a name.
pub trait Store: Send + Sync {
    /// Lists all tasks, newest first.
    fn list_tasks(&self) -> StoreFuture<Vec<Task>>;

    /// Persists a new task with a fresh id, `completed = false` and `created_at = now`.
    fn create_task(&self, task: NewTask) -> StoreFuture<Task>;

    /// Sets the completion flag of an existing task.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no task has the given id.
    fn update_task_completion(&self, id: &TaskId, completed: bool) -> StoreFuture<Task>;

    /// Removes a task.
    ///
    /// Returns `Ok(true)` if a record was removed, `Ok(false)` if it did not exist.
    fn delete_task(&self, id: &TaskId) -> StoreFuture<bool>;

    /// Lists all assignees, sorted by name ascending.
    fn list_assignees(&self) -> StoreFuture<Vec<Assignee>>;

    /// Persists a new assignee.
    ///
    /// The name must already be trimmed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the name is already taken.
    fn create_assignee(&self, name: &str) -> StoreFuture<Assignee>;
}

/// Sorts assignees by name ascending.
pub fn sort_by_name(assignees: &mut [Assignee]) {
    assignees.sort_by(|left, right| left.name.cmp(&right.name));
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AssigneeId;
    use rstest::rstest;

    #[rstest]
    fn test_store_error_display() {
        let error = StoreError::NotFound("task-123".to_string());
        assert_eq!(format!("{error}"), "Entity not found: task-123");

        let error = StoreError::Conflict("Assignee already exists".to_string());
        assert_eq!(format!("{error}"), "Conflict: Assignee already exists");

        let error = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(format!("{error}"), "Store unavailable: connection refused");
    }

    #[rstest]
    fn test_sort_by_name_is_case_sensitive_byte_order() {
        let mut assignees = vec![
            Assignee::new(AssigneeId::new("1"), "bob"),
            Assignee::new(AssigneeId::new("2"), "Zoe"),
            Assignee::new(AssigneeId::new("3"), "Adam"),
        ];

        sort_by_name(&mut assignees);

        let names: Vec<&str> = assignees.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Adam", "Zoe", "bob"]);
    }
}
