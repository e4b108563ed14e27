//! Client-side synchronization.
//!
//! A [`SyncClient`] keeps cached copies of the task and assignee lists,
//! applies writes optimistically and reconciles by polling a [`Gateway`].

pub mod cache;
pub mod client;
pub mod gateway;

pub use cache::{
    AssigneeMutation, CacheSnapshot, CacheState, Mutation, SyncedCache, TaskMutation,
};
pub use client::{PollingHandle, SyncClient, SyncConfig, SyncConfigError};
pub use gateway::{Gateway, GatewayFuture, HttpGateway, ServiceGateway, SyncError};
