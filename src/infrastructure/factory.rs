//! Store factory for runtime backend selection.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `file` (default) | `in_memory` | `postgres`
//! - `DATA_DIR`: directory for the flat-file backend (default: `data`)
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//!
//! # Example
//!
//! ```ignore
//! let config = StoreConfig::from_env()?;
//! let store = StoreFactory::new(config).create().await?;
//! let tasks = store.list_tasks().await?;
//! ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use super::{FlatFileStore, InMemoryStore, PostgresStore, Store, StoreError};

/// Default directory for the flat-file backend.
pub const DEFAULT_DATA_DIR: &str = "data";

// =============================================================================
// Configuration Types
// =============================================================================

/// Which backend holds the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// One JSON file per collection.
    #[default]
    FlatFile,
    /// Process memory; lost on restart.
    InMemory,
    /// `PostgreSQL` JSONB documents.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "file" | "flat_file" | "json" => Ok(Self::FlatFile),
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Configuration for the store factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Selected backend.
    pub storage_mode: StorageMode,
    /// Directory for the flat-file backend.
    pub data_dir: PathBuf,
    /// `PostgreSQL` connection URL (required when `storage_mode` is `Postgres`).
    pub database_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            database_url: None,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Creates a configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `STORAGE_MODE` is invalid or
    /// `DATABASE_URL` is missing when `STORAGE_MODE=postgres`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Creates a configuration from an arbitrary variable lookup.
    ///
    /// Empty or whitespace-only values count as unset.
    ///
    /// # Errors
    ///
    /// Same as [`StoreConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let storage_mode = match read("STORAGE_MODE") {
            Some(value) => value.parse()?,
            None => StorageMode::default(),
        };

        let config = Self {
            storage_mode,
            data_dir: read("DATA_DIR").map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from),
            database_url: read("DATABASE_URL"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` if Postgres is selected without a URL.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_mode == StorageMode::Postgres && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

/// Builder for `StoreConfig`.
#[derive(Debug, Clone, Default)]
pub struct StoreConfigBuilder {
    storage_mode: StorageMode,
    data_dir: Option<PathBuf>,
    database_url: Option<String>,
}

impl StoreConfigBuilder {
    /// Sets the storage mode.
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// Sets the flat-file data directory.
    #[must_use]
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets the `PostgreSQL` database URL.
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<StoreConfig, ConfigurationError> {
        let config = StoreConfig {
            storage_mode: self.storage_mode,
            data_dir: self
                .data_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            database_url: self.database_url,
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors in store configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'file', 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    /// Missing `DATABASE_URL` when storage mode is Postgres.
    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,
}

/// Errors that can occur during store initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Backend could not be opened.
    #[error("Store initialization error: {0}")]
    Store(#[from] StoreError),
}

// =============================================================================
// Store Factory
// =============================================================================

/// Creates the configured `Store` backend.
#[derive(Debug, Clone)]
pub struct StoreFactory {
    config: StoreConfig,
}

impl StoreFactory {
    /// Creates a new factory with the given configuration.
    #[must_use]
    pub const fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Creates a new factory from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Configuration` if environment configuration is invalid.
    pub fn from_env() -> Result<Self, FactoryError> {
        Ok(Self::new(StoreConfig::from_env()?))
    }

    /// Returns the configuration used by this factory.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Opens the configured backend.
    ///
    /// The flat-file backend bootstraps its files; the Postgres backend
    /// connects and migrates its schema.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the backend cannot be opened.
    pub async fn create(&self) -> Result<Arc<dyn Store>, FactoryError> {
        self.config.validate()?;

        match self.config.storage_mode {
            StorageMode::InMemory => Ok(Arc::new(InMemoryStore::new())),
            StorageMode::FlatFile => {
                let store = FlatFileStore::open(self.config.data_dir.clone()).await?;
                Ok(Arc::new(store))
            }
            StorageMode::Postgres => {
                let database_url = self
                    .config
                    .database_url
                    .as_deref()
                    .ok_or(ConfigurationError::MissingDatabaseUrl)?;
                let store = PostgresStore::connect(database_url).await?;
                store.migrate().await?;
                Ok(Arc::new(store))
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
