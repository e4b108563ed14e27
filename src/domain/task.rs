//! Task domain model.
//!
//! A task is a to-do item with free text, a list of assignee names and a
//! completion flag. Its JSON form is the wire and file format:
//!
//! ```json
//! {"id": "...", "text": "...", "assignees": ["Bob"], "completed": false, "createdAt": 1700000000000}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Opaque unique identifier for a task.
///
/// Identifiers are produced by an `IdGenerator` at creation time and never
/// change afterwards. Clients may send arbitrary strings back, so this is a
/// string newtype rather than a parsed UUID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a `TaskId` from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Creation time in milliseconds since the Unix epoch.
///
/// Serialized as a bare integer so that `createdAt` round-trips without
/// precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a `Timestamp` from epoch milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the epoch milliseconds.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the current wall-clock time.
    ///
    /// Stores and clients read time through a `Clock` so tests can control it;
    /// this is what `SystemClock` delegates to.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Converts to a `DateTime<Utc>`, if the value is in chrono's range.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(datetime) => write!(formatter, "{}", datetime.format("%Y-%m-%d %H:%M:%S%.3f UTC")),
            None => write!(formatter, "{}ms", self.0),
        }
    }
}

// =============================================================================
// Task Entity
// =============================================================================

/// A task record.
///
/// `completed` is the only field that changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, assigned at creation.
    pub id: TaskId,
    /// Non-empty description of the work.
    pub text: String,
    /// Names of the people the task is assigned to, in selection order.
    #[serde(default)]
    pub assignees: Vec<String>,
    /// Whether the task is done.
    #[serde(default)]
    pub completed: bool,
    /// Creation time; the sort key for listings.
    pub created_at: Timestamp,
}

impl Task {
    /// Creates a new, not yet completed task.
    #[must_use]
    pub fn new(
        id: TaskId,
        text: impl Into<String>,
        assignees: Vec<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            assignees,
            completed: false,
            created_at,
        }
    }

    /// Returns a copy with the completion flag replaced.
    #[must_use]
    pub fn with_completed(self, completed: bool) -> Self {
        Self { completed, ..self }
    }
}

/// Sorts tasks newest first.
///
/// The sort is stable, so tasks sharing a timestamp keep their relative order.
/// Backends that keep their records newest-insertion-first therefore break
/// ties by insertion order.
pub fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|left, right| right.created_at.cmp(&left.created_at));
}

// =============================================================================
// Creation Input
// =============================================================================

/// Validated input for creating a task.
///
/// Built by `TaskService` after trimming; stores persist it verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Trimmed, non-empty text.
    pub text: String,
    /// Trimmed, de-duplicated assignee names.
    pub assignees: Vec<String>,
}

impl NewTask {
    /// Creates a new task input.
    #[must_use]
    pub fn new(text: impl Into<String>, assignees: Vec<String>) -> Self {
        Self {
            text: text.into(),
            assignees,
        }
    }

    /// Materializes the record with its generated identity.
    #[must_use]
    pub fn into_task(self, id: TaskId, created_at: Timestamp) -> Task {
        Task::new(id, self.text, self.assignees, created_at)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn task_at(id: &str, millis: i64) -> Task {
        Task::new(TaskId::from(id), id, vec![], Timestamp::from_millis(millis))
    }

    #[rstest]
    fn test_task_json_shape() {
        let task = Task::new(
            TaskId::from("task-1"),
            "Buy milk",
            vec!["Bob".to_string()],
            Timestamp::from_millis(1_700_000_000_123),
        );

        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": "task-1",
                "text": "Buy milk",
                "assignees": ["Bob"],
                "completed": false,
                "createdAt": 1_700_000_000_123_i64,
            })
        );
    }

    #[rstest]
    fn test_task_json_round_trip_preserves_fields() {
        let task = Task::new(
            TaskId::from("task-2"),
            "Write report",
            vec!["Zoe".to_string(), "Adam".to_string(), "Mia".to_string()],
            Timestamp::from_millis(1_699_999_999_999),
        )
        .with_completed(true);

        let encoded = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, task);
        assert_eq!(decoded.assignees, vec!["Zoe", "Adam", "Mia"]);
    }

    #[rstest]
    fn test_task_deserialize_defaults_missing_optional_fields() {
        let decoded: Task =
            serde_json::from_str(r#"{"id":"x","text":"Legacy","createdAt":5}"#).unwrap();

        assert!(decoded.assignees.is_empty());
        assert!(!decoded.completed);
    }

    #[rstest]
    fn test_with_completed_only_changes_flag() {
        let task = task_at("a", 10);
        let toggled = task.clone().with_completed(true);

        assert!(toggled.completed);
        assert_eq!(toggled.id, task.id);
        assert_eq!(toggled.text, task.text);
        assert_eq!(toggled.created_at, task.created_at);
    }

    #[rstest]
    fn test_sort_newest_first_is_stable_for_ties() {
        let mut tasks = vec![task_at("b", 20), task_at("a", 10), task_at("c", 20), task_at("d", 30)];

        sort_newest_first(&mut tasks);

        let ids: Vec<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "c", "a"]);
    }

    #[rstest]
    fn test_timestamp_display() {
        let timestamp = Timestamp::from_millis(0);
        assert_eq!(timestamp.to_string(), "1970-01-01 00:00:00.000 UTC");
    }
}
