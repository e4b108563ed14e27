//! Optimistic, polling sync client.
//!
//! Every write follows the same protocol: edit the local cache, send the
//! write, then re-fetch unconditionally. A failed write is only logged; the
//! re-fetch rolls the optimistic edit back.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::cache::{AssigneeMutation, SyncedCache, TaskMutation};
use super::gateway::Gateway;
use crate::domain::{NewTask, Task, TaskId, normalize_name, normalize_names};
use crate::infrastructure::{Clock, IdGenerator, SystemClock, UuidIdGenerator};

/// Default task refresh period in milliseconds.
pub const DEFAULT_TASK_REFRESH_MS: u64 = 1_000;
/// Default assignee refresh period in milliseconds.
pub const DEFAULT_ASSIGNEE_REFRESH_MS: u64 = 2_000;

// =============================================================================
// Configuration
// =============================================================================

/// Invalid polling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncConfigError {
    /// A refresh interval is not a positive integer.
    #[error("{variable}='{value}' is not a positive number of milliseconds")]
    InvalidInterval {
        /// Variable name.
        variable: &'static str,
        /// Rejected value.
        value: String,
    },
}

/// Polling periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Period of the task refresh loop.
    pub task_refresh_interval: Duration,
    /// Period of the assignee refresh loop.
    pub assignee_refresh_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            task_refresh_interval: Duration::from_millis(DEFAULT_TASK_REFRESH_MS),
            assignee_refresh_interval: Duration::from_millis(DEFAULT_ASSIGNEE_REFRESH_MS),
        }
    }
}

impl SyncConfig {
    /// Reads `TASK_REFRESH_INTERVAL_MS` and `ASSIGNEE_REFRESH_INTERVAL_MS`.
    ///
    /// # Errors
    ///
    /// Returns `SyncConfigError::InvalidInterval` for a value that is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, SyncConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`SyncConfig::from_env`] over an arbitrary lookup.
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Same as [`SyncConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |variable: &'static str, default: u64| -> Result<Duration, SyncConfigError> {
            let Some(value) = lookup(variable)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
            else {
                return Ok(Duration::from_millis(default));
            };
            value
                .parse::<u64>()
                .ok()
                .filter(|millis| *millis > 0)
                .map(Duration::from_millis)
                .ok_or(SyncConfigError::InvalidInterval { variable, value })
        };

        Ok(Self {
            task_refresh_interval: read("TASK_REFRESH_INTERVAL_MS", DEFAULT_TASK_REFRESH_MS)?,
            assignee_refresh_interval: read(
                "ASSIGNEE_REFRESH_INTERVAL_MS",
                DEFAULT_ASSIGNEE_REFRESH_MS,
            )?,
        })
    }
}

// =============================================================================
// SyncClient
// =============================================================================

/// Client-side view of tasks and assignees kept in sync with a [`Gateway`].
#[derive(Clone)]
pub struct SyncClient {
    gateway: Arc<dyn Gateway>,
    tasks: Arc<SyncedCache<Task>>,
    assignees: Arc<SyncedCache<String>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl SyncClient {
    /// Creates a client with random ids and the system clock for optimistic records.
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self::with_identity(gateway, Arc::new(UuidIdGenerator), Arc::new(SystemClock))
    }

    /// Creates a client with the given id and time sources for optimistic records.
    #[must_use]
    pub fn with_identity(
        gateway: Arc<dyn Gateway>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            tasks: Arc::new(SyncedCache::new()),
            assignees: Arc::new(SyncedCache::new()),
            ids,
            clock,
        }
    }

    /// Task cache.
    #[must_use]
    pub fn tasks(&self) -> &SyncedCache<Task> {
        &self.tasks
    }

    /// Assignee name cache.
    #[must_use]
    pub fn assignees(&self) -> &SyncedCache<String> {
        &self.assignees
    }

    /// Adds a task. Blank text is ignored.
    pub async fn add_task(&self, text: &str, assignees: Vec<String>) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let assignees = normalize_names(assignees);

        let local = NewTask::new(text, assignees.clone())
            .into_task(TaskId::new(self.ids.next_id()), self.clock.now());
        self.tasks.apply_optimistic(TaskMutation::Prepend(local));

        match self.gateway.create_task(text.to_string(), assignees).await {
            Ok(task) => tracing::debug!(task_id = %task.id, "Task create confirmed"),
            Err(error) => tracing::warn!(%error, "Task create failed"),
        }
        self.refresh_tasks().await;
    }

    /// Flips the completion flag of a cached task.
    ///
    /// Ids absent from the cache are ignored.
    pub async fn toggle_completion(&self, id: &TaskId) {
        let Some(completed) = self
            .tasks
            .data()
            .and_then(|tasks| tasks.into_iter().find(|task| &task.id == id))
            .map(|task| !task.completed)
        else {
            tracing::debug!(task_id = %id, "Toggle ignored for uncached task");
            return;
        };

        self.tasks.apply_optimistic(TaskMutation::SetCompleted {
            id: id.clone(),
            completed,
        });

        match self.gateway.set_completion(id.clone(), completed).await {
            Ok(task) => tracing::debug!(task_id = %task.id, completed, "Task update confirmed"),
            Err(error) => tracing::warn!(task_id = %id, %error, "Task update failed"),
        }
        self.refresh_tasks().await;
    }

    /// Deletes a task.
    pub async fn delete_task(&self, id: &TaskId) {
        self.tasks.apply_optimistic(TaskMutation::Remove(id.clone()));

        match self.gateway.delete_task(id.clone()).await {
            Ok(()) => tracing::debug!(task_id = %id, "Task delete confirmed"),
            Err(error) => tracing::warn!(task_id = %id, %error, "Task delete failed"),
        }
        self.refresh_tasks().await;
    }

    /// Adds an assignee. Blank names are ignored.
    pub async fn add_assignee(&self, name: &str) {
        let Some(name) = normalize_name(name) else {
            return;
        };

        self.assignees
            .apply_optimistic(AssigneeMutation::Append(name.clone()));

        match self.gateway.create_assignee(name).await {
            Ok(name) => tracing::debug!(%name, "Assignee create confirmed"),
            Err(error) => tracing::warn!(%error, "Assignee create failed"),
        }
        self.refresh_assignees().await;
    }

    /// Re-fetches tasks and reconciles the cache.
    ///
    /// A failed fetch leaves the data in place and records the error.
    pub async fn refresh_tasks(&self) {
        match self.gateway.fetch_tasks().await {
            Ok(tasks) => self.tasks.reconcile(tasks),
            Err(error) => {
                tracing::warn!(%error, "Task refresh failed");
                self.tasks.record_error(error.to_string());
            }
        }
    }

    /// Re-fetches assignees and reconciles the cache.
    pub async fn refresh_assignees(&self) {
        match self.gateway.fetch_assignees().await {
            Ok(names) => self.assignees.reconcile(names),
            Err(error) => {
                tracing::warn!(%error, "Assignee refresh failed");
                self.assignees.record_error(error.to_string());
            }
        }
    }

    /// Starts the background refresh loops.
    ///
    /// Both loops fetch immediately, then once per period. The task loop
    /// also fetches on [`PollingHandle::notify_focus`]. Dropping the handle
    /// stops both loops.
    #[must_use]
    pub fn spawn_polling(&self, config: SyncConfig) -> PollingHandle {
        let focus = Arc::new(Notify::new());
        let (shutdown, shutdown_receiver) = watch::channel(false);

        let task_loop = {
            let client = self.clone();
            let focus = Arc::clone(&focus);
            let mut shutdown = shutdown_receiver.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.task_refresh_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {}
                        () = focus.notified() => {
                            tracing::debug!("Focus regained, refreshing tasks");
                        }
                        _ = shutdown.changed() => break,
                    }
                    client.refresh_tasks().await;
                }
            })
        };

        let assignee_loop = {
            let client = self.clone();
            let mut shutdown = shutdown_receiver;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.assignee_refresh_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {}
                        _ = shutdown.changed() => break,
                    }
                    client.refresh_assignees().await;
                }
            })
        };

        PollingHandle {
            focus,
            shutdown,
            loops: vec![task_loop, assignee_loop],
        }
    }
}

// =============================================================================
// PollingHandle
// =============================================================================

/// Control over the loops started by [`SyncClient::spawn_polling`].
#[derive(Debug)]
pub struct PollingHandle {
    focus: Arc<Notify>,
    shutdown: watch::Sender<bool>,
    loops: Vec<JoinHandle<()>>,
}

impl PollingHandle {
    /// Triggers an immediate task refresh.
    pub fn notify_focus(&self) {
        self.focus.notify_one();
    }

    /// Stops both loops and waits for them to finish.
    ///
    /// An in-flight refresh completes first.
    pub async fn shutdown(self) {
        self.shutdown.send_replace(true);
        for handle in self.loops {
            if let Err(error) = handle.await {
                tracing::error!(%error, "Polling loop terminated abnormally");
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::Timestamp;
    use crate::infrastructure::{InMemoryStore, ManualClock, SequentialIdGenerator};
    use crate::sync::cache::CacheState;
    use crate::sync::gateway::{GatewayFuture, ServiceGateway, SyncError};
    use rstest::rstest;

    // -------------------------------------------------------------------------
    // Test gateways
    // -------------------------------------------------------------------------

    /// Counts fetches and fails every write.
    #[derive(Default)]
    struct CountingGateway {
        task_fetches: AtomicUsize,
        assignee_fetches: AtomicUsize,
    }

    impl CountingGateway {
        fn task_fetches(&self) -> usize {
            self.task_fetches.load(Ordering::SeqCst)
        }

        fn assignee_fetches(&self) -> usize {
            self.assignee_fetches.load(Ordering::SeqCst)
        }
    }

    fn refused<T: Send + 'static>() -> GatewayFuture<T> {
        Box::pin(async { Err(SyncError::Transport("refused".to_string())) })
    }

    impl Gateway for CountingGateway {
        fn fetch_tasks(&self) -> GatewayFuture<Vec<Task>> {
            self.task_fetches.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(Vec::new()) })
        }

        fn fetch_assignees(&self) -> GatewayFuture<Vec<String>> {
            self.assignee_fetches.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(Vec::new()) })
        }

        fn create_task(&self, _text: String, _assignees: Vec<String>) -> GatewayFuture<Task> {
            refused()
        }

        fn set_completion(&self, _id: TaskId, _completed: bool) -> GatewayFuture<Task> {
            refused()
        }

        fn delete_task(&self, _id: TaskId) -> GatewayFuture<()> {
            refused()
        }

        fn create_assignee(&self, _name: String) -> GatewayFuture<String> {
            refused()
        }
    }

    /// Delegates to a `ServiceGateway`, holding every write until released.
    struct GatedGateway {
        inner: ServiceGateway,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl GatedGateway {
        fn gate<T: Send + 'static>(&self, write: GatewayFuture<T>) -> GatewayFuture<T> {
            let entered = Arc::clone(&self.entered);
            let release = Arc::clone(&self.release);
            Box::pin(async move {
                entered.notify_one();
                release.notified().await;
                write.await
            })
        }
    }

    impl Gateway for GatedGateway {
        fn fetch_tasks(&self) -> GatewayFuture<Vec<Task>> {
            self.inner.fetch_tasks()
        }

        fn fetch_assignees(&self) -> GatewayFuture<Vec<String>> {
            self.inner.fetch_assignees()
        }

        fn create_task(&self, text: String, assignees: Vec<String>) -> GatewayFuture<Task> {
            self.gate(self.inner.create_task(text, assignees))
        }

        fn set_completion(&self, id: TaskId, completed: bool) -> GatewayFuture<Task> {
            self.gate(self.inner.set_completion(id, completed))
        }

        fn delete_task(&self, id: TaskId) -> GatewayFuture<()> {
            self.gate(self.inner.delete_task(id))
        }

        fn create_assignee(&self, name: String) -> GatewayFuture<String> {
            self.gate(self.inner.create_assignee(name))
        }
    }

    fn service_client() -> SyncClient {
        let store = Arc::new(InMemoryStore::with_identity(
            Arc::new(SequentialIdGenerator::new("server")),
            Arc::new(ManualClock::new(10_000, 1)),
        ));
        SyncClient::with_identity(
            Arc::new(ServiceGateway::from_store(store)),
            Arc::new(SequentialIdGenerator::new("local")),
            Arc::new(ManualClock::new(20_000, 1)),
        )
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_config_defaults() {
        let config = SyncConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.task_refresh_interval, Duration::from_secs(1));
        assert_eq!(config.assignee_refresh_interval, Duration::from_secs(2));
    }

    #[rstest]
    fn test_config_overrides() {
        let values = HashMap::from([
            ("TASK_REFRESH_INTERVAL_MS", "250"),
            ("ASSIGNEE_REFRESH_INTERVAL_MS", " 5000 "),
        ]);

        let config =
            SyncConfig::from_lookup(|key| values.get(key).map(ToString::to_string)).unwrap();

        assert_eq!(config.task_refresh_interval, Duration::from_millis(250));
        assert_eq!(config.assignee_refresh_interval, Duration::from_secs(5));
    }

    #[rstest]
    #[case("0")]
    #[case("-5")]
    #[case("fast")]
    fn test_config_rejects_invalid_interval(#[case] value: &str) {
        let result = SyncConfig::from_lookup(|key| {
            (key == "TASK_REFRESH_INTERVAL_MS").then(|| value.to_string())
        });

        assert_eq!(
            result,
            Err(SyncConfigError::InvalidInterval {
                variable: "TASK_REFRESH_INTERVAL_MS",
                value: value.to_string(),
            })
        );
    }

    // -------------------------------------------------------------------------
    // Optimistic protocol
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_optimistic_task_visible_before_write_completes() {
        let store = Arc::new(InMemoryStore::new());
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let client = SyncClient::with_identity(
            Arc::new(GatedGateway {
                inner: ServiceGateway::from_store(store),
                entered: Arc::clone(&entered),
                release: Arc::clone(&release),
            }),
            Arc::new(SequentialIdGenerator::new("local")),
            Arc::new(ManualClock::frozen(5)),
        );

        let pending = tokio::spawn({
            let client = client.clone();
            async move { client.add_task("Buy milk", vec![" Bob ".to_string()]).await }
        });
        entered.notified().await;

        let snapshot = client.tasks().snapshot();
        assert_eq!(snapshot.state, CacheState::OptimisticallyModified);
        let optimistic = snapshot.data.unwrap();
        assert_eq!(optimistic.len(), 1);
        assert_eq!(optimistic[0].id, TaskId::from("local-1"));
        assert_eq!(optimistic[0].created_at, Timestamp::from_millis(5));
        assert_eq!(optimistic[0].assignees, vec!["Bob"]);

        release.notify_one();
        pending.await.unwrap();

        let snapshot = client.tasks().snapshot();
        assert_eq!(snapshot.state, CacheState::Synced);
        let confirmed = snapshot.data.unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_ne!(confirmed[0].id, TaskId::from("local-1"));
        assert_eq!(confirmed[0].text, "Buy milk");
    }

    #[rstest]
    #[tokio::test]
    async fn test_failed_write_is_rolled_back_by_refetch() {
        let gateway = Arc::new(CountingGateway::default());
        let client = SyncClient::new(gateway.clone());

        client.add_task("Buy milk", Vec::new()).await;
        client.add_assignee("Bob").await;

        assert_eq!(client.tasks().data(), Some(Vec::new()));
        assert_eq!(client.tasks().state(), CacheState::Synced);
        assert_eq!(client.assignees().data(), Some(Vec::new()));
        assert_eq!(gateway.task_fetches(), 1);
        assert_eq!(gateway.assignee_fetches(), 1);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[tokio::test]
    async fn test_blank_input_is_ignored(#[case] input: &str) {
        let gateway = Arc::new(CountingGateway::default());
        let client = SyncClient::new(gateway.clone());

        client.add_task(input, Vec::new()).await;
        client.add_assignee(input).await;

        assert_eq!(client.tasks().data(), None);
        assert_eq!(client.assignees().data(), None);
        assert_eq!(gateway.task_fetches(), 0);
        assert_eq!(gateway.assignee_fetches(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_toggle_and_delete_reconcile() {
        let client = service_client();
        client.add_task("Ship", Vec::new()).await;
        let id = client.tasks().data().unwrap()[0].id.clone();

        client.toggle_completion(&id).await;
        assert!(client.tasks().data().unwrap()[0].completed);

        client.toggle_completion(&id).await;
        assert!(!client.tasks().data().unwrap()[0].completed);

        client.delete_task(&id).await;
        assert_eq!(client.tasks().data(), Some(Vec::new()));
        assert_eq!(client.tasks().state(), CacheState::Synced);
    }

    #[rstest]
    #[tokio::test]
    async fn test_toggle_uncached_task_is_noop() {
        let gateway = Arc::new(CountingGateway::default());
        let client = SyncClient::new(gateway.clone());

        client.toggle_completion(&TaskId::from("ghost")).await;

        assert_eq!(client.tasks().data(), None);
        assert_eq!(gateway.task_fetches(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_duplicate_assignee_reconciles_to_server_list() {
        let client = service_client();
        client.add_assignee("Bob").await;

        client.add_assignee("  Bob ").await;

        assert_eq!(client.assignees().data(), Some(vec!["Bob".to_string()]));
    }

    // -------------------------------------------------------------------------
    // Polling
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_polling_periods() {
        let gateway = Arc::new(CountingGateway::default());
        let client = SyncClient::new(gateway.clone());

        let handle = client.spawn_polling(SyncConfig::default());
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        handle.shutdown().await;

        // Ticks at 0, 1s, 2s, 3s for tasks and 0, 2s for assignees.
        assert_eq!(gateway.task_fetches(), 4);
        assert_eq!(gateway.assignee_fetches(), 2);
        assert_eq!(client.tasks().data(), Some(Vec::new()));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_focus_triggers_task_refresh() {
        let gateway = Arc::new(CountingGateway::default());
        let client = SyncClient::new(gateway.clone());
        let config = SyncConfig {
            task_refresh_interval: Duration::from_secs(3_600),
            assignee_refresh_interval: Duration::from_secs(3_600),
        };

        let handle = client.spawn_polling(config);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(gateway.task_fetches(), 1);

        handle.notify_focus();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(gateway.task_fetches(), 2);
        assert_eq!(gateway.assignee_fetches(), 1);

        handle.shutdown().await;
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_stops_polling() {
        let gateway = Arc::new(CountingGateway::default());
        let client = SyncClient::new(gateway.clone());

        drop(client.spawn_polling(SyncConfig::default()));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(gateway.task_fetches() <= 1);
    }
}
