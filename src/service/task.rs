//! Task service.
//!
//! Shapes raw input before it reaches the store: text is trimmed and must be
//! non-empty, assignee names are normalized, ids must be present.

use std::sync::Arc;

use crate::domain::{NewTask, Task, TaskId, normalize_names};
use crate::infrastructure::Store;

use super::ServiceError;

/// Message for a missing or blank task id.
pub const MISSING_TASK_ID: &str = "Missing task ID";
/// Message for a missing or blank task text.
pub const MISSING_TASK_TEXT: &str = "Task text is required";
/// Message for a missing completion flag.
pub const MISSING_COMPLETED: &str = "Missing completion flag";
/// Message for an unknown task id.
pub const TASK_NOT_FOUND: &str = "Task not found";

/// Task operations on top of a `Store`.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
}

impl TaskService {
    /// Creates a service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Lists all tasks, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::StoreUnavailable` if the store fails.
    pub async fn list(&self) -> Result<Vec<Task>, ServiceError> {
        Ok(self.store.list_tasks().await?)
    }

    /// Creates a task.
    ///
    /// `text` is trimmed; `assignees` defaults to empty and is normalized
    /// (trimmed, blanks dropped, duplicates removed in order).
    ///
    /// # Errors
    ///
    /// - `ServiceError::BadRequest` if `text` is missing or blank.
    /// - `ServiceError::StoreUnavailable` if the store fails.
    pub async fn create(
        &self,
        text: Option<String>,
        assignees: Option<Vec<String>>,
    ) -> Result<Task, ServiceError> {
        let text = text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ServiceError::BadRequest(MISSING_TASK_TEXT.to_string()))?;
        let assignees = normalize_names(assignees.unwrap_or_default());

        let task = self.store.create_task(NewTask::new(text, assignees)).await?;
        tracing::info!(task_id = %task.id, assignees = task.assignees.len(), "Task created");
        Ok(task)
    }

    /// Sets the completion flag of a task.
    ///
    /// # Errors
    ///
    /// - `ServiceError::BadRequest` if `id` or `completed` is missing.
    /// - `ServiceError::NotFound` if no task has the id.
    /// - `ServiceError::StoreUnavailable` if the store fails.
    pub async fn set_completion(
        &self,
        id: Option<String>,
        completed: Option<bool>,
    ) -> Result<Task, ServiceError> {
        let id = required_id(id)?;
        let completed =
            completed.ok_or_else(|| ServiceError::BadRequest(MISSING_COMPLETED.to_string()))?;

        let task = self
            .store
            .update_task_completion(&id, completed)
            .await
            .map_err(|error| match ServiceError::from(error) {
                ServiceError::NotFound(_) => ServiceError::NotFound(TASK_NOT_FOUND.to_string()),
                other => other,
            })?;

        tracing::info!(task_id = %task.id, completed, "Task completion updated");
        Ok(task)
    }

    /// Deletes a task. Deleting an unknown id succeeds.
    ///
    /// # Errors
    ///
    /// - `ServiceError::BadRequest` if `id` is missing.
    /// - `ServiceError::StoreUnavailable` if the store fails.
    pub async fn delete(&self, id: Option<String>) -> Result<(), ServiceError> {
        let id = required_id(id)?;
        let removed = self.store.delete_task(&id).await?;
        tracing::info!(task_id = %id, removed, "Task deleted");
        Ok(())
    }
}

fn required_id(id: Option<String>) -> Result<TaskId, ServiceError> {
    id.filter(|id| !id.trim().is_empty())
        .map(TaskId::from)
        .ok_or_else(|| ServiceError::BadRequest(MISSING_TASK_ID.to_string()))
}

// =============================================================================
// Tests
// =============================================================================
