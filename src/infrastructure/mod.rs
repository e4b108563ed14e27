//! Infrastructure module for persistence.
//!
//! This module contains the `Store` contract, its backends, the injected
//! identity capabilities and the factory that wires them from configuration.

pub mod factory;
pub mod flat_file;
pub mod identity;
pub mod in_memory;
pub mod postgres;
pub mod repository;

pub use factory::{
    ConfigurationError, FactoryError, StorageMode, StoreConfig, StoreConfigBuilder, StoreFactory,
};
pub use flat_file::FlatFileStore;
pub use identity::{
    Clock, IdGenerator, ManualClock, SequentialIdGenerator, SystemClock, UuidIdGenerator,
};
pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use repository::{Store, StoreError, StoreFuture};
