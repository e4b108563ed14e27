//! REST API over the task and assignee services.
//!
//! | Method | Path         | Handler           |
//! |--------|--------------|-------------------|
//! | GET    | `/tasks`     | [`list_tasks`]    |
//! | POST   | `/tasks`     | [`create_task`]   |
//! | PUT    | `/tasks`     | [`update_task`]   |
//! | DELETE | `/tasks?id=` | [`delete_task`]   |
//! | GET    | `/assignees` | [`list_assignees`]|
//! | POST   | `/assignees` | [`create_assignee`]|
//! | GET    | `/health`    | [`health_check`]  |

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;

pub use dto::{
    AssigneeResponse, CreateAssigneeRequest, CreateTaskRequest, DeleteTaskQuery,
    DeleteTaskResponse, TaskResponse, UpdateTaskRequest,
};
pub use error::{ApiError, ApiErrorResponse};
pub use handlers::{
    AppState, HealthResponse, create_assignee, create_task, delete_task, health_check,
    list_assignees, list_tasks, update_task,
};
pub use router::build_router;
