//! Assignee service.

use std::sync::Arc;

use crate::domain::{Assignee, normalize_name};
use crate::infrastructure::Store;

use super::ServiceError;

/// Message for a missing or blank name.
pub const INVALID_NAME: &str = "Invalid name";
/// Message for a duplicate name.
pub const ASSIGNEE_EXISTS: &str = "Assignee already exists";

/// Assignee operations on top of a `Store`.
#[derive(Clone)]
pub struct AssigneeService {
    store: Arc<dyn Store>,
}

impl AssigneeService {
    /// Creates a service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Lists all assignee names, ascending.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::StoreUnavailable` if the store fails.
    pub async fn list_names(&self) -> Result<Vec<String>, ServiceError> {
        let assignees = self.store.list_assignees().await?;
        Ok(assignees.into_iter().map(|assignee| assignee.name).collect())
    }

    /// Creates an assignee from a raw name.
    ///
    /// The name is trimmed before the uniqueness check and before storage.
    ///
    /// # Errors
    ///
    /// - `ServiceError::BadRequest` if the name is missing or blank.
    /// - `ServiceError::Conflict` if the trimmed name already exists.
    /// - `ServiceError::StoreUnavailable` if the store fails.
    pub async fn create(&self, name: Option<String>) -> Result<Assignee, ServiceError> {
        let name = name
            .as_deref()
            .and_then(normalize_name)
            .ok_or_else(|| ServiceError::BadRequest(INVALID_NAME.to_string()))?;

        let assignee = self
            .store
            .create_assignee(&name)
            .await
            .map_err(|error| match ServiceError::from(error) {
                ServiceError::Conflict(_) => ServiceError::Conflict(ASSIGNEE_EXISTS.to_string()),
                other => other,
            })?;

        tracing::info!(assignee_id = %assignee.id, name = %assignee.name, "Assignee created");
        Ok(assignee)
    }
}
