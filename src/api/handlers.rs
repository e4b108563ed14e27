//! HTTP handlers for the task delegation API.
//!
//! Handlers only translate between HTTP and the services: extraction,
//! status codes and DTO conversion. Validation lives in the services.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Serialize;

use super::dto::{
    AssigneeResponse, CreateAssigneeRequest, CreateTaskRequest, DeleteTaskQuery,
    DeleteTaskResponse, TaskResponse, UpdateTaskRequest,
};
use super::error::ApiErrorResponse;
use crate::infrastructure::Store;
use crate::service::{AssigneeService, TaskService};

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
#[derive(Clone)]
pub struct AppState {
    /// Task operations.
    pub task_service: TaskService,
    /// Assignee operations.
    pub assignee_service: AssigneeService,
}

impl AppState {
    /// Builds both services over one store.
    #[must_use]
    pub fn from_store(store: Arc<dyn Store>) -> Self {
        Self {
            task_service: TaskService::new(Arc::clone(&store)),
            assignee_service: AssigneeService::new(store),
        }
    }
}

// =============================================================================
// Task Handlers
// =============================================================================

/// `GET /tasks`: all tasks, newest first.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn list_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, ApiErrorResponse> {
    let tasks = state
        .task_service
        .list()
        .await
        .map_err(|error| ApiErrorResponse::from_service_error(error, "Failed to fetch tasks"))?;

    Ok(Json(tasks.iter().map(TaskResponse::from).collect()))
}

/// `POST /tasks`: creates a task.
///
/// # Response
///
/// - **201 Created**: the stored task
/// - **400 Bad Request**: malformed body or blank text
///
/// # Errors
///
/// Returns an error response if validation or the store fails.
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiErrorResponse> {
    let Json(request) = payload?;

    let task = state
        .task_service
        .create(request.text, request.assignees)
        .await
        .map_err(|error| ApiErrorResponse::from_service_error(error, "Failed to create task"))?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

/// `PUT /tasks`: sets the completion flag of a task.
///
/// # Errors
///
/// Returns 400 for a missing id or flag, 404 for an unknown id and 500 if
/// the store fails.
pub async fn update_task(
    State(state): State<AppState>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let Json(request) = payload?;

    let task = state
        .task_service
        .set_completion(request.id, request.completed)
        .await
        .map_err(|error| ApiErrorResponse::from_service_error(error, "Failed to update task"))?;

    Ok(Json(TaskResponse::from(task)))
}

/// `DELETE /tasks?id=<id>`: removes a task. Unknown ids succeed.
///
/// # Errors
///
/// Returns 400 for a missing id and 500 if the store fails.
pub async fn delete_task(
    State(state): State<AppState>,
    query: Result<Query<DeleteTaskQuery>, QueryRejection>,
) -> Result<Json<DeleteTaskResponse>, ApiErrorResponse> {
    let Query(query) = query?;

    state
        .task_service
        .delete(query.id)
        .await
        .map_err(|error| ApiErrorResponse::from_service_error(error, "Failed to delete task"))?;

    Ok(Json(DeleteTaskResponse { success: true }))
}

// =============================================================================
// Assignee Handlers
// =============================================================================

/// `GET /assignees`: all assignee names, ascending.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn list_assignees(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiErrorResponse> {
    let names = state.assignee_service.list_names().await.map_err(|error| {
        ApiErrorResponse::from_service_error(error, "Failed to fetch assignees")
    })?;

    Ok(Json(names))
}

/// `POST /assignees`: registers an assignee name.
///
/// # Response
///
/// - **201 Created**: `{"name": "<trimmed name>"}`
/// - **400 Bad Request**: blank name, or `CONFLICT` for a duplicate
///
/// # Errors
///
/// Returns an error response if validation or the store fails.
pub async fn create_assignee(
    State(state): State<AppState>,
    payload: Result<Json<CreateAssigneeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AssigneeResponse>), ApiErrorResponse> {
    let Json(request) = payload?;

    let assignee = state
        .assignee_service
        .create(request.name)
        .await
        .map_err(|error| ApiErrorResponse::from_service_error(error, "Failed to add assignee"))?;

    Ok((
        StatusCode::CREATED,
        Json(AssigneeResponse {
            name: assignee.name,
        }),
    ))
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// API version.
    pub version: &'static str,
}

/// `GET /health`: liveness probe.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Tests
// =============================================================================
