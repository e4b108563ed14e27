//! Transport used by the sync client to reach the services.
//!
//! [`HttpGateway`] talks to a running server over the REST surface;
//! [`ServiceGateway`] calls the services in-process.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::{
    ApiError, AssigneeResponse, CreateAssigneeRequest, CreateTaskRequest, TaskResponse,
    UpdateTaskRequest,
};
use crate::domain::{Task, TaskId};
use crate::service::{AssigneeService, ServiceError, TaskService};

// =============================================================================
// Error
// =============================================================================

/// Failure of a gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The request could not be sent or the connection failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("Request failed with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message reported by the server.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<ServiceError> for SyncError {
    fn from(error: ServiceError) -> Self {
        let status = match &error {
            ServiceError::BadRequest(_) | ServiceError::Conflict(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::Status {
            status: status.as_u16(),
            message: error.to_string(),
        }
    }
}

/// Boxed future returned by gateway operations.
pub type GatewayFuture<T> = BoxFuture<'static, Result<T, SyncError>>;

// =============================================================================
// Gateway
// =============================================================================

/// Reads and writes against the authoritative task and assignee data.
pub trait Gateway: Send + Sync {
    /// Fetches all tasks, newest first.
    fn fetch_tasks(&self) -> GatewayFuture<Vec<Task>>;

    /// Fetches all assignee names.
    fn fetch_assignees(&self) -> GatewayFuture<Vec<String>>;

    /// Creates a task.
    fn create_task(&self, text: String, assignees: Vec<String>) -> GatewayFuture<Task>;

    /// Sets the completion flag of a task.
    fn set_completion(&self, id: TaskId, completed: bool) -> GatewayFuture<Task>;

    /// Deletes a task.
    fn delete_task(&self, id: TaskId) -> GatewayFuture<()>;

    /// Registers an assignee, returning the stored name.
    fn create_assignee(&self, name: String) -> GatewayFuture<String>;
}

// =============================================================================
// HttpGateway
// =============================================================================

/// Gateway over the REST API.
///
/// Requests carry no timeout; a slow server stalls the caller.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Creates a gateway for the server at `base_url` (e.g. `http://localhost:3000`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a gateway sharing an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Returns the base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Gateway for HttpGateway {
    fn fetch_tasks(&self) -> GatewayFuture<Vec<Task>> {
        let request = self.client.get(self.url("/tasks"));
        Box::pin(async move {
            let tasks: Vec<TaskResponse> = send_json(request).await?;
            Ok(tasks.into_iter().map(Task::from).collect())
        })
    }

    fn fetch_assignees(&self) -> GatewayFuture<Vec<String>> {
        let request = self.client.get(self.url("/assignees"));
        Box::pin(async move { send_json(request).await })
    }

    fn create_task(&self, text: String, assignees: Vec<String>) -> GatewayFuture<Task> {
        let request = self.client.post(self.url("/tasks")).json(&CreateTaskRequest {
            text: Some(text),
            assignees: Some(assignees),
        });
        Box::pin(async move {
            let task: TaskResponse = send_json(request).await?;
            Ok(Task::from(task))
        })
    }

    fn set_completion(&self, id: TaskId, completed: bool) -> GatewayFuture<Task> {
        let request = self.client.put(self.url("/tasks")).json(&UpdateTaskRequest {
            id: Some(id.to_string()),
            completed: Some(completed),
        });
        Box::pin(async move {
            let task: TaskResponse = send_json(request).await?;
            Ok(Task::from(task))
        })
    }

    fn delete_task(&self, id: TaskId) -> GatewayFuture<()> {
        let client = self.client.clone();
        let url = self.url("/tasks");
        Box::pin(async move {
            let url = reqwest::Url::parse_with_params(&url, &[("id", id.as_str())])
                .map_err(|error| SyncError::Transport(error.to_string()))?;
            let _: serde_json::Value = send_json(client.delete(url)).await?;
            Ok(())
        })
    }

    fn create_assignee(&self, name: String) -> GatewayFuture<String> {
        let request = self
            .client
            .post(self.url("/assignees"))
            .json(&CreateAssigneeRequest { name: Some(name) });
        Box::pin(async move {
            let assignee: AssigneeResponse = send_json(request).await?;
            Ok(assignee.name)
        })
    }
}

/// Sends a request and decodes a JSON success body.
///
/// Error statuses are turned into `SyncError::Status` carrying the server's
/// `error` message when the body has one.
async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, SyncError> {
    let response = request
        .send()
        .await
        .map_err(|error| SyncError::Transport(error.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|error| SyncError::Decode(error.to_string()));
    }

    let body = response
        .text()
        .await
        .map_err(|error| SyncError::Transport(error.to_string()))?;
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|error| error.error)
        .unwrap_or(body);

    Err(SyncError::Status {
        status: status.as_u16(),
        message,
    })
}

// =============================================================================
// ServiceGateway
// =============================================================================

/// Gateway calling the services directly, without HTTP.
#[derive(Clone)]
pub struct ServiceGateway {
    tasks: TaskService,
    assignees: AssigneeService,
}

impl ServiceGateway {
    /// Creates a gateway over the given services.
    #[must_use]
    pub const fn new(tasks: TaskService, assignees: AssigneeService) -> Self {
        Self { tasks, assignees }
    }

    /// Creates a gateway with both services over one store.
    #[must_use]
    pub fn from_store(store: Arc<dyn crate::infrastructure::Store>) -> Self {
        Self::new(TaskService::new(Arc::clone(&store)), AssigneeService::new(store))
    }
}

impl Gateway for ServiceGateway {
    fn fetch_tasks(&self) -> GatewayFuture<Vec<Task>> {
        let service = self.tasks.clone();
        Box::pin(async move { Ok(service.list().await?) })
    }

    fn fetch_assignees(&self) -> GatewayFuture<Vec<String>> {
        let service = self.assignees.clone();
        Box::pin(async move { Ok(service.list_names().await?) })
    }

    fn create_task(&self, text: String, assignees: Vec<String>) -> GatewayFuture<Task> {
        let service = self.tasks.clone();
        Box::pin(async move { Ok(service.create(Some(text), Some(assignees)).await?) })
    }

    fn set_completion(&self, id: TaskId, completed: bool) -> GatewayFuture<Task> {
        let service = self.tasks.clone();
        Box::pin(async move {
            Ok(service
                .set_completion(Some(id.to_string()), Some(completed))
                .await?)
        })
    }

    fn delete_task(&self, id: TaskId) -> GatewayFuture<()> {
        let service = self.tasks.clone();
        Box::pin(async move { Ok(service.delete(Some(id.to_string())).await?) })
    }

    fn create_assignee(&self, name: String) -> GatewayFuture<String> {
        let service = self.assignees.clone();
        Box::pin(async move {
            let assignee = service.create(Some(name)).await?;
            Ok(assignee.name)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
