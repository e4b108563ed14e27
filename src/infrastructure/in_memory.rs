//! In-memory store implementation.
//!
//! Suitable for tests and throwaway development servers. State lives behind
//! `Arc<RwLock<...>>`, so clones of the store share the same records.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{Assignee, AssigneeId, NewTask, Task, TaskId, sort_newest_first};
use crate::infrastructure::{
    Clock, IdGenerator, Store, StoreError, StoreFuture, SystemClock, UuidIdGenerator,
};

/// In-memory implementation of `Store`.
///
/// Tasks are kept newest-insertion-first; assignees are keyed by name, which
/// gives both the uniqueness check and the ascending listing order.
///
/// # Example
///
/// ```ignore
/// let store = InMemoryStore::new();
/// let task = store.create_task(NewTask::new("Buy milk", vec![])).await?;
/// let tasks = store.list_tasks().await?;
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    tasks: Arc<RwLock<Vec<Task>>>,
    assignees: Arc<RwLock<BTreeMap<String, Assignee>>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    /// Creates an empty store using UUID ids and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_identity(Arc::new(UuidIdGenerator), Arc::new(SystemClock))
    }

    /// Creates an empty store with injected id and time sources.
    #[must_use]
    pub fn with_identity(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(Vec::new())),
            assignees: Arc::new(RwLock::new(BTreeMap::new())),
            ids,
            clock,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("InMemoryStore")
            .field("ids", &"Arc<dyn IdGenerator>")
            .field("clock", &"Arc<dyn Clock>")
            .finish_non_exhaustive()
    }
}

#[allow(clippy::significant_drop_tightening)]
impl Store for InMemoryStore {
    fn list_tasks(&self) -> StoreFuture<Vec<Task>> {
        let tasks = Arc::clone(&self.tasks);
        Box::pin(async move {
            let mut snapshot = tasks.read().await.clone();
            sort_newest_first(&mut snapshot);
            Ok(snapshot)
        })
    }

    fn create_task(&self, task: NewTask) -> StoreFuture<Task> {
        let tasks = Arc::clone(&self.tasks);
        let ids = Arc::clone(&self.ids);
        let clock = Arc::clone(&self.clock);
        Box::pin(async move {
            let mut guard = tasks.write().await;
            let created = task.into_task(TaskId::new(ids.next_id()), clock.now());
            guard.insert(0, created.clone());
            Ok(created)
        })
    }

    fn update_task_completion(&self, id: &TaskId, completed: bool) -> StoreFuture<Task> {
        let tasks = Arc::clone(&self.tasks);
        let id = id.clone();
        Box::pin(async move {
            let mut guard = tasks.write().await;
            let task = guard
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            task.completed = completed;
            Ok(task.clone())
        })
    }

    fn delete_task(&self, id: &TaskId) -> StoreFuture<bool> {
        let tasks = Arc::clone(&self.tasks);
        let id = id.clone();
        Box::pin(async move {
            let mut guard = tasks.write().await;
            let before = guard.len();
            guard.retain(|task| task.id != id);
            Ok(guard.len() != before)
        })
    }

    fn list_assignees(&self) -> StoreFuture<Vec<Assignee>> {
        let assignees = Arc::clone(&self.assignees);
        Box::pin(async move { Ok(assignees.read().await.values().cloned().collect()) })
    }

    fn create_assignee(&self, name: &str) -> StoreFuture<Assignee> {
        let assignees = Arc::clone(&self.assignees);
        let ids = Arc::clone(&self.ids);
        let name = name.to_string();
        Box::pin(async move {
            let mut guard = assignees.write().await;
            if guard.contains_key(&name) {
                return Err(StoreError::Conflict(format!("Assignee '{name}' already exists")));
            }
            let assignee = Assignee::new(AssigneeId::new(ids.next_id()), name.clone());
            guard.insert(name, assignee.clone());
            Ok(assignee)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
