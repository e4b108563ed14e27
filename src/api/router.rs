//! Route table.

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    AppState, create_assignee, create_task, delete_task, health_check, list_assignees,
    list_tasks, update_task,
};

/// Builds the application router with tracing and permissive CORS.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/tasks",
            get(list_tasks)
                .post(create_task)
                .put(update_task)
                .delete(delete_task),
        )
        .route("/assignees", get(list_assignees).post(create_assignee))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
