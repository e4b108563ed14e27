//! Task delegation service.
//!
//! Tasks carry free text, a list of assignee names and a completion flag;
//! assignees are a registry of unique names. Both are persisted behind the
//! [`infrastructure::Store`] contract, exposed over REST by [`api`], and
//! mirrored on the client side by [`sync::SyncClient`].

pub mod api;
pub mod domain;
pub mod infrastructure;
pub mod service;
pub mod sync;
