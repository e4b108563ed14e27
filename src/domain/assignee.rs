//! Assignee domain model.

use serde::{Deserialize, Serialize};

/// Unique identifier for an assignee record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssigneeId(String);

impl AssigneeId {
    /// Creates an `AssigneeId` from any string-like value.
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

impl std::fmt::Display for AssigneeId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A named person tasks can be assigned to.
///
/// Tasks refer to assignees by `name`, not by `id`. Names are unique across
/// the collection (exact, case-sensitive match after trimming).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    /// Record identifier.
    pub id: AssigneeId,
    /// Trimmed, non-empty display name.
    pub name: String,
}

impl Assignee {
    /// Creates a new assignee record.
    #[must_use]
    pub fn new(id: AssigneeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Trims a raw name, returning `None` when nothing is left.
#[must_use]
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalizes a list of assignee names for a task.
///
/// Blank entries are dropped and repeated names keep only their first
/// occurrence, so the result behaves like an ordered set.
#[must_use]
pub fn normalize_names<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = Vec::new();
    for name in raw.into_iter().filter_map(|name| normalize_name(name.as_ref())) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
