//! Flat-file store implementation.
//!
//! Each collection is one JSON array in its own file inside a data directory:
//!
//! ```text
//! <data_dir>/tasks.json      [{"id": ..., "text": ..., "assignees": [...], "completed": ..., "createdAt": ...}, ...]
//! <data_dir>/assignees.json  [{"id": ..., "name": ...}, ...]
//! ```
//!
//! Every operation reads the whole file, changes it in memory and writes the
//! whole file back. A missing file is created as `[]` on first access.
//!
//! Read-modify-write cycles are serialized by a per-store mutex, and writes go
//! through a temporary sibling file that is renamed into place. Separate
//! processes sharing a directory are not coordinated: the last writer wins.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::domain::{Assignee, AssigneeId, NewTask, Task, TaskId, sort_newest_first};
use crate::infrastructure::repository::sort_by_name;
use crate::infrastructure::{
    Clock, IdGenerator, Store, StoreError, StoreFuture, SystemClock, UuidIdGenerator,
};

/// File holding the task array.
pub const TASKS_FILE: &str = "tasks.json";
/// File holding the assignee array.
pub const ASSIGNEES_FILE: &str = "assignees.json";

/// JSON-file implementation of `Store`.
#[derive(Clone)]
pub struct FlatFileStore {
    tasks_path: PathBuf,
    assignees_path: PathBuf,
    lock: Arc<Mutex<()>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl FlatFileStore {
    /// Opens (and bootstraps) a store in `data_dir` with UUID ids and the system clock.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the directory or files cannot be created.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_identity(data_dir, Arc::new(UuidIdGenerator), Arc::new(SystemClock)).await
    }

    /// Opens a store with injected id and time sources.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the directory or files cannot be created.
    pub async fn open_with_identity(
        data_dir: impl Into<PathBuf>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|error| io_error(&data_dir, &error))?;

        let store = Self {
            tasks_path: data_dir.join(TASKS_FILE),
            assignees_path: data_dir.join(ASSIGNEES_FILE),
            lock: Arc::new(Mutex::new(())),
            ids,
            clock,
        };

        {
            let _guard = store.lock.lock().await;
            bootstrap(&store.tasks_path).await?;
            bootstrap(&store.assignees_path).await?;
        }
        tracing::debug!(data_dir = %data_dir.display(), "Flat-file store opened");

        Ok(store)
    }

    /// Path of the task file.
    #[must_use]
    pub fn tasks_path(&self) -> &Path {
        &self.tasks_path
    }

    /// Path of the assignee file.
    #[must_use]
    pub fn assignees_path(&self) -> &Path {
        &self.assignees_path
    }
}

impl std::fmt::Debug for FlatFileStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FlatFileStore")
            .field("tasks_path", &self.tasks_path)
            .field("assignees_path", &self.assignees_path)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// File Helpers
// =============================================================================

fn io_error(path: &Path, error: &std::io::Error) -> StoreError {
    StoreError::Unavailable(format!("{}: {error}", path.display()))
}

/// Creates `path` containing `[]` if it does not exist yet.
async fn bootstrap(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::info!(path = %path.display(), "Creating empty collection file");
            write_atomically(path, b"[]").await
        }
        Err(error) => Err(io_error(path, &error)),
    }
}

/// Reads the whole array stored at `path`.
///
/// A missing or blank file reads as an empty collection and is re-created.
async fn load<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    bootstrap(path).await?;
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|error| io_error(path, &error))?;

    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&contents).map_err(|error| {
        StoreError::Serialization(format!("{}: {error}", path.display()))
    })
}

/// Replaces the array stored at `path`.
async fn persist<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let encoded = serde_json::to_vec_pretty(records)
        .map_err(|error| StoreError::Serialization(error.to_string()))?;
    write_atomically(path, &encoded).await
}

async fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let temporary = path.with_extension("json.tmp");
    tokio::fs::write(&temporary, contents)
        .await
        .map_err(|error| io_error(&temporary, &error))?;
    tokio::fs::rename(&temporary, path)
        .await
        .map_err(|error| io_error(path, &error))
}

// =============================================================================
// Store Implementation
// =============================================================================

impl Store for FlatFileStore {
    fn list_tasks(&self) -> StoreFuture<Vec<Task>> {
        let store = self.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            let mut tasks: Vec<Task> = load(&store.tasks_path).await?;
            sort_newest_first(&mut tasks);
            Ok(tasks)
        })
    }

    fn create_task(&self, task: NewTask) -> StoreFuture<Task> {
        let store = self.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            let mut tasks: Vec<Task> = load(&store.tasks_path).await?;

            let created = task.into_task(TaskId::new(store.ids.next_id()), store.clock.now());
            tasks.insert(0, created.clone());
            persist(&store.tasks_path, &tasks).await?;

            tracing::debug!(task_id = %created.id, "Task written to file");
            Ok(created)
        })
    }

    fn update_task_completion(&self, id: &TaskId, completed: bool) -> StoreFuture<Task> {
        let store = self.clone();
        let id = id.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            let mut tasks: Vec<Task> = load(&store.tasks_path).await?;

            let task = tasks
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            task.completed = completed;
            let updated = task.clone();

            persist(&store.tasks_path, &tasks).await?;
            Ok(updated)
        })
    }

    fn delete_task(&self, id: &TaskId) -> StoreFuture<bool> {
        let store = self.clone();
        let id = id.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            let mut tasks: Vec<Task> = load(&store.tasks_path).await?;

            let before = tasks.len();
            tasks.retain(|task| task.id != id);
            if tasks.len() == before {
                return Ok(false);
            }

            persist(&store.tasks_path, &tasks).await?;
            Ok(true)
        })
    }

    fn list_assignees(&self) -> StoreFuture<Vec<Assignee>> {
        let store = self.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            let mut assignees: Vec<Assignee> = load(&store.assignees_path).await?;
            sort_by_name(&mut assignees);
            Ok(assignees)
        })
    }

    fn create_assignee(&self, name: &str) -> StoreFuture<Assignee> {
        let store = self.clone();
        let name = name.to_string();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            let mut assignees: Vec<Assignee> = load(&store.assignees_path).await?;

            if assignees.iter().any(|assignee| assignee.name == name) {
                return Err(StoreError::Conflict(format!("Assignee '{name}' already exists")));
            }

            let assignee = Assignee::new(AssigneeId::new(store.ids.next_id()), name);
            assignees.push(assignee.clone());
            sort_by_name(&mut assignees);
            persist(&store.assignees_path, &assignees).await?;

            Ok(assignee)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
