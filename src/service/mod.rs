//! Service layer between the transport surfaces and the `Store`.
//!
//! Services validate and normalize input, translate store failures into the
//! [`ServiceError`] taxonomy and log every successful mutation.

pub mod assignee;
pub mod error;
pub mod task;

pub use assignee::AssigneeService;
pub use error::ServiceError;
pub use task::TaskService;
