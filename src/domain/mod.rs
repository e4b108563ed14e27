//! Domain module for task delegation.
//!
//! This module contains the task and assignee records and the pure
//! normalization rules applied to them.

pub mod assignee;
pub mod task;

pub use assignee::{Assignee, AssigneeId, normalize_name, normalize_names};
pub use task::{NewTask, Task, TaskId, Timestamp, sort_newest_first};
