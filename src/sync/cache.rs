//! Observable client-side cache with optimistic updates.
//!
//! A cache starts empty (`data: None`) and `Synced`. Local mutations move it
//! to `OptimisticallyModified`; only a completed re-fetch moves it back to
//! `Synced`. The response of a write request never touches the cache.

use tokio::sync::watch;

use crate::domain::{Task, TaskId};

// =============================================================================
// State
// =============================================================================

/// Whether the cached data reflects the last fetch or local edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheState {
    /// Data equals the last successful fetch.
    #[default]
    Synced,
    /// Data carries local changes not yet confirmed by a fetch.
    OptimisticallyModified,
}

/// Point-in-time view of a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot<T> {
    /// `None` until the first successful fetch (or first optimistic insert).
    pub data: Option<Vec<T>>,
    /// Current state.
    pub state: CacheState,
    /// Message of the last failed fetch, cleared by a successful one.
    pub last_error: Option<String>,
}

impl<T> Default for CacheSnapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            state: CacheState::Synced,
            last_error: None,
        }
    }
}

// =============================================================================
// Mutations
// =============================================================================

/// A local edit to a cached collection.
pub trait Mutation {
    /// Element type of the collection.
    type Item;

    /// Applies the edit, returning the new collection.
    fn apply(self, data: Option<Vec<Self::Item>>) -> Option<Vec<Self::Item>>;
}

/// Local edits to the task cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskMutation {
    /// Inserts a task at the front (newest first).
    Prepend(Task),
    /// Sets the completion flag of the task with the id.
    SetCompleted {
        /// Target task.
        id: TaskId,
        /// New flag.
        completed: bool,
    },
    /// Removes the task with the id.
    Remove(TaskId),
}

impl Mutation for TaskMutation {
    type Item = Task;

    fn apply(self, data: Option<Vec<Task>>) -> Option<Vec<Task>> {
        match self {
            Self::Prepend(task) => {
                let mut tasks = data.unwrap_or_default();
                tasks.insert(0, task);
                Some(tasks)
            }
            Self::SetCompleted { id, completed } => data.map(|tasks| {
                tasks
                    .into_iter()
                    .map(|task| {
                        if task.id == id {
                            task.with_completed(completed)
                        } else {
                            task
                        }
                    })
                    .collect()
            }),
            Self::Remove(id) => data.map(|tasks| {
                tasks.into_iter().filter(|task| task.id != id).collect()
            }),
        }
    }
}

/// Local edits to the assignee name cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeMutation {
    /// Appends a name.
    Append(String),
}

impl Mutation for AssigneeMutation {
    type Item = String;

    fn apply(self, data: Option<Vec<String>>) -> Option<Vec<String>> {
        match self {
            Self::Append(name) => {
                let mut names = data.unwrap_or_default();
                names.push(name);
                Some(names)
            }
        }
    }
}

// =============================================================================
// SyncedCache
// =============================================================================

/// Cache of one collection, observable through a `watch` channel.
#[derive(Debug)]
pub struct SyncedCache<T> {
    sender: watch::Sender<CacheSnapshot<T>>,
}

impl<T: Clone> SyncedCache<T> {
    /// Creates an empty, synced cache.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(CacheSnapshot::default());
        Self { sender }
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CacheSnapshot<T> {
        self.sender.borrow().clone()
    }

    /// Returns a copy of the cached data.
    #[must_use]
    pub fn data(&self) -> Option<Vec<T>> {
        self.sender.borrow().data.clone()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CacheState {
        self.sender.borrow().state
    }

    /// Subscribes to changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CacheSnapshot<T>> {
        self.sender.subscribe()
    }

    /// Applies a local edit and marks the cache as optimistically modified.
    pub fn apply_optimistic<M>(&self, mutation: M)
    where
        M: Mutation<Item = T>,
    {
        self.sender.send_modify(|snapshot| {
            snapshot.data = mutation.apply(snapshot.data.take());
            snapshot.state = CacheState::OptimisticallyModified;
        });
    }

    /// Replaces the data with a fresh fetch result.
    pub fn reconcile(&self, fresh: Vec<T>) {
        self.sender.send_modify(|snapshot| {
            snapshot.data = Some(fresh);
            snapshot.state = CacheState::Synced;
            snapshot.last_error = None;
        });
    }

    /// Records a failed fetch. Data and state are kept.
    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.sender.send_modify(|snapshot| {
            snapshot.last_error = Some(message);
        });
    }
}

impl<T: Clone> Default for SyncedCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;
    use rstest::{fixture, rstest};

    fn task(id: &str, created_at: i64) -> Task {
        Task::new(
            TaskId::from(id),
            format!("task {id}"),
            Vec::new(),
            Timestamp::from_millis(created_at),
        )
    }

    #[fixture]
    fn synced() -> SyncedCache<Task> {
        let cache = SyncedCache::new();
        cache.reconcile(vec![task("b", 2), task("a", 1)]);
        cache
    }

    #[rstest]
    fn test_new_cache_is_empty_and_synced() {
        let cache: SyncedCache<Task> = SyncedCache::new();
        assert_eq!(cache.snapshot(), CacheSnapshot::default());
    }

    #[rstest]
    fn test_prepend_on_empty_cache() {
        let cache = SyncedCache::new();

        cache.apply_optimistic(TaskMutation::Prepend(task("a", 1)));

        assert_eq!(cache.data(), Some(vec![task("a", 1)]));
        assert_eq!(cache.state(), CacheState::OptimisticallyModified);
    }

    #[rstest]
    #[case(TaskMutation::SetCompleted { id: TaskId::from("a"), completed: true })]
    #[case(TaskMutation::Remove(TaskId::from("a")))]
    fn test_edits_on_empty_cache_keep_none(#[case] mutation: TaskMutation) {
        let cache = SyncedCache::new();

        cache.apply_optimistic(mutation);

        assert_eq!(cache.data(), None);
    }

    #[rstest]
    fn test_prepend_puts_newest_first(synced: SyncedCache<Task>) {
        synced.apply_optimistic(TaskMutation::Prepend(task("c", 3)));

        let ids: Vec<String> = synced
            .data()
            .unwrap()
            .into_iter()
            .map(|task| task.id.to_string())
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[rstest]
    fn test_set_completed_only_touches_target(synced: SyncedCache<Task>) {
        synced.apply_optimistic(TaskMutation::SetCompleted {
            id: TaskId::from("a"),
            completed: true,
        });

        let tasks = synced.data().unwrap();
        assert!(!tasks[0].completed);
        assert!(tasks[1].completed);
    }

    #[rstest]
    fn test_remove(synced: SyncedCache<Task>) {
        synced.apply_optimistic(TaskMutation::Remove(TaskId::from("b")));
        assert_eq!(synced.data(), Some(vec![task("a", 1)]));
    }

    #[rstest]
    fn test_reconcile_returns_to_synced(synced: SyncedCache<Task>) {
        synced.apply_optimistic(TaskMutation::Remove(TaskId::from("b")));
        synced.record_error("connection refused");

        synced.reconcile(vec![task("x", 9)]);

        let snapshot = synced.snapshot();
        assert_eq!(snapshot.data, Some(vec![task("x", 9)]));
        assert_eq!(snapshot.state, CacheState::Synced);
        assert_eq!(snapshot.last_error, None);
    }

    #[rstest]
    fn test_record_error_keeps_stale_data(synced: SyncedCache<Task>) {
        synced.apply_optimistic(TaskMutation::Prepend(task("c", 3)));

        synced.record_error("timeout");

        let snapshot = synced.snapshot();
        assert_eq!(snapshot.data.map(|tasks| tasks.len()), Some(3));
        assert_eq!(snapshot.state, CacheState::OptimisticallyModified);
        assert_eq!(snapshot.last_error.as_deref(), Some("timeout"));
    }

    #[rstest]
    fn test_assignee_append() {
        let cache = SyncedCache::new();
        cache.reconcile(vec!["Ann".to_string()]);

        cache.apply_optimistic(AssigneeMutation::Append("Bob".to_string()));

        assert_eq!(cache.data(), Some(vec!["Ann".to_string(), "Bob".to_string()]));
    }

    #[rstest]
    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let cache: SyncedCache<String> = SyncedCache::new();
        let mut receiver = cache.subscribe();

        cache.apply_optimistic(AssigneeMutation::Append("Bob".to_string()));

        receiver.changed().await.unwrap();
        assert_eq!(
            receiver.borrow_and_update().state,
            CacheState::OptimisticallyModified
        );
    }
}
