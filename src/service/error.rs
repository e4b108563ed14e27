//! Service-level error taxonomy.

use thiserror::Error;

use crate::infrastructure::StoreError;

/// Errors returned by `TaskService` and `AssigneeService`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A required field is missing or invalid.
    #[error("{0}")]
    BadRequest(String),

    /// A unique key is already taken.
    #[error("{0}")]
    Conflict(String),

    /// The referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The backing store failed.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(message) => Self::NotFound(message),
            StoreError::Conflict(message) => Self::Conflict(message),
            StoreError::Unavailable(message) | StoreError::Serialization(message) => {
                Self::StoreUnavailable(message)
            }
        }
    }
}
