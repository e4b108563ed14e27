//! `PostgreSQL` document-store implementation.
//!
//! Each record is stored as a JSONB document next to the few columns that
//! need indexing. Uniqueness of assignee names is enforced by the database.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id TEXT PRIMARY KEY,
//!     data JSONB NOT NULL,
//!     created_at BIGINT NOT NULL,
//!     seq BIGSERIAL
//! );
//! CREATE INDEX idx_tasks_created_at ON tasks (created_at DESC, seq DESC);
//!
//! CREATE TABLE assignees (
//!     id TEXT PRIMARY KEY,
//!     name TEXT NOT NULL,
//!     data JSONB NOT NULL
//! );
//! CREATE UNIQUE INDEX idx_assignees_name ON assignees (name);
//! ```

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::domain::{Assignee, AssigneeId, NewTask, Task, TaskId};
use crate::infrastructure::{
    Clock, IdGenerator, Store, StoreError, StoreFuture, SystemClock, UuidIdGenerator,
};

/// Idempotent schema statements, run in order by [`PostgresStore::migrate`].
const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS tasks (\
         id TEXT PRIMARY KEY, \
         data JSONB NOT NULL, \
         created_at BIGINT NOT NULL, \
         seq BIGSERIAL)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks (created_at DESC, seq DESC)",
    "CREATE TABLE IF NOT EXISTS assignees (\
         id TEXT PRIMARY KEY, \
         name TEXT NOT NULL, \
         data JSONB NOT NULL)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_assignees_name ON assignees (name)",
];

/// Maximum pooled connections.
const MAX_CONNECTIONS: u32 = 10;

// =============================================================================
// Helper Functions
// =============================================================================

#[allow(clippy::needless_pass_by_value)]
fn database_error(error: sqlx::Error) -> StoreError {
    StoreError::Unavailable(error.to_string())
}

fn decode<T: serde::de::DeserializeOwned>(data: serde_json::Value) -> Result<T, StoreError> {
    serde_json::from_value(data).map_err(|error| StoreError::Serialization(error.to_string()))
}

fn encode<T: serde::Serialize>(record: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(record).map_err(|error| StoreError::Serialization(error.to_string()))
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(database) if database.is_unique_violation())
}

// =============================================================================
// PostgreSQL Store
// =============================================================================

/// `PostgreSQL` implementation of `Store`.
///
/// # Example
///
/// ```ignore
/// let store = PostgresStore::connect("postgres://localhost/tasks").await?;
/// store.migrate().await?;
/// let tasks = store.list_tasks().await?;
/// ```
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl PostgresStore {
    /// Creates a store over an existing pool, with UUID ids and the system clock.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_identity(pool, Arc::new(UuidIdGenerator), Arc::new(SystemClock))
    }

    /// Creates a store with injected id and time sources.
    #[must_use]
    pub fn with_identity(pool: PgPool, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { pool, ids, clock }
    }

    /// Connects a new pool to `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the connection cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(database_error)?;
        Ok(Self::new(pool))
    }

    /// Creates tables and indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if any statement fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(database_error)?;
        }
        tracing::info!("Document store schema is up to date");
        Ok(())
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PostgresStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl Store for PostgresStore {
    fn list_tasks(&self) -> StoreFuture<Vec<Task>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let rows: Vec<(serde_json::Value,)> =
                sqlx::query_as("SELECT data FROM tasks ORDER BY created_at DESC, seq DESC")
                    .fetch_all(&pool)
                    .await
                    .map_err(database_error)?;

            rows.into_iter().map(|(data,)| decode(data)).collect()
        })
    }

    fn create_task(&self, task: NewTask) -> StoreFuture<Task> {
        let pool = self.pool.clone();
        let created = task.into_task(TaskId::new(self.ids.next_id()), self.clock.now());
        Box::pin(async move {
            let data = encode(&created)?;

            sqlx::query("INSERT INTO tasks (id, data, created_at) VALUES ($1, $2, $3)")
                .bind(created.id.as_str())
                .bind(&data)
                .bind(created.created_at.as_millis())
                .execute(&pool)
                .await
                .map_err(database_error)?;

            Ok(created)
        })
    }

    fn update_task_completion(&self, id: &TaskId, completed: bool) -> StoreFuture<Task> {
        let pool = self.pool.clone();
        let id = id.clone();
        Box::pin(async move {
            let row: Option<(serde_json::Value,)> = sqlx::query_as(
                "UPDATE tasks SET data = jsonb_set(data, '{completed}', to_jsonb($2::boolean)) \
                 WHERE id = $1 RETURNING data",
            )
            .bind(id.as_str())
            .bind(completed)
            .fetch_optional(&pool)
            .await
            .map_err(database_error)?;

            match row {
                Some((data,)) => decode(data),
                None => Err(StoreError::NotFound(id.to_string())),
            }
        })
    }

    fn delete_task(&self, id: &TaskId) -> StoreFuture<bool> {
        let pool = self.pool.clone();
        let id = id.clone();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
                .bind(id.as_str())
                .execute(&pool)
                .await
                .map_err(database_error)?;

            Ok(result.rows_affected() > 0)
        })
    }

    fn list_assignees(&self) -> StoreFuture<Vec<Assignee>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            // "C" collation gives the same byte order as the other backends.
            let rows: Vec<(serde_json::Value,)> =
                sqlx::query_as(r#"SELECT data FROM assignees ORDER BY name COLLATE "C" ASC"#)
                    .fetch_all(&pool)
                    .await
                    .map_err(database_error)?;

            rows.into_iter().map(|(data,)| decode(data)).collect()
        })
    }

    fn create_assignee(&self, name: &str) -> StoreFuture<Assignee> {
        let pool = self.pool.clone();
        let assignee = Assignee::new(AssigneeId::new(self.ids.next_id()), name);
        Box::pin(async move {
            let data = encode(&assignee)?;

            sqlx::query("INSERT INTO assignees (id, name, data) VALUES ($1, $2, $3)")
                .bind(assignee.id.as_str())
                .bind(&assignee.name)
                .bind(&data)
                .execute(&pool)
                .await
                .map_err(|error| {
                    if is_unique_violation(&error) {
                        StoreError::Conflict(format!("Assignee '{}' already exists", assignee.name))
                    } else {
                        database_error(error)
                    }
                })?;

            Ok(assignee)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
