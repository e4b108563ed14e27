//! Common test helpers for integration tests.
//!
//! # Note
//!
//! Each integration test file is compiled as a separate crate, so helpers
//! used by only some of them would otherwise warn as dead code.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use task_delegation::api::{AppState, build_router};
use task_delegation::infrastructure::{
    FlatFileStore, InMemoryStore, ManualClock, SequentialIdGenerator, Store,
};

/// Creates an in-memory store with sequential ids and a clock ticking 1 ms per call.
pub fn deterministic_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::with_identity(
        Arc::new(SequentialIdGenerator::new("task")),
        Arc::new(ManualClock::new(1_700_000_000_000, 1)),
    ))
}

/// Creates a router over an in-memory store.
pub fn memory_router() -> Router {
    router_over(deterministic_store())
}

/// Creates a router over a flat-file store rooted at `dir`.
pub async fn file_router(dir: &Path) -> Router {
    let store = FlatFileStore::open(dir).await.unwrap();
    router_over(Arc::new(store))
}

/// Creates a router over any store.
pub fn router_over(store: Arc<dyn Store>) -> Router {
    build_router(AppState::from_store(store))
}

/// Sends a request and returns the status and decoded JSON body.
///
/// An empty body decodes to `Value::Null`.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}
