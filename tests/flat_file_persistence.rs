//! Durability of the flat-file backend across process restarts.

mod common;

use axum::http::{Method, StatusCode};
use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

use common::{file_router, send};
use task_delegation::infrastructure::{StorageMode, StoreConfig, StoreFactory};

#[rstest]
#[tokio::test]
async fn tasks_survive_restart() {
    let dir = TempDir::new().unwrap();

    let (_, created) = {
        let router = file_router(dir.path()).await;
        send(
            &router,
            Method::POST,
            "/tasks",
            Some(json!({"text": "Buy milk", "assignees": ["Bob"]})),
        )
        .await
    };

    // Fresh store over the same directory reads everything back from disk.
    let router = file_router(dir.path()).await;
    let (status, listed) = send(&router, Method::GET, "/tasks", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));
}

#[rstest]
#[tokio::test]
async fn assignees_and_updates_survive_restart() {
    let dir = TempDir::new().unwrap();

    let updated = {
        let router = file_router(dir.path()).await;
        send(
            &router,
            Method::POST,
            "/assignees",
            Some(json!({"name": "Bob"})),
        )
        .await;
        let (_, created) =
            send(&router, Method::POST, "/tasks", Some(json!({"text": "Ship"}))).await;
        let (_, updated) = send(
            &router,
            Method::PUT,
            "/tasks",
            Some(json!({"id": created["id"], "completed": true})),
        )
        .await;
        updated
    };

    let router = file_router(dir.path()).await;
    let (_, tasks) = send(&router, Method::GET, "/tasks", None).await;
    let (_, names) = send(&router, Method::GET, "/assignees", None).await;
    let (status, _) = send(
        &router,
        Method::POST,
        "/assignees",
        Some(json!({"name": "Bob"})),
    )
    .await;

    assert_eq!(tasks, json!([updated]));
    assert_eq!(names, json!(["Bob"]));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test]
async fn factory_opens_configured_directory() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::builder()
        .storage_mode(StorageMode::FlatFile)
        .data_dir(dir.path().join("data"))
        .build()
        .unwrap();

    let store = StoreFactory::new(config).create().await.unwrap();

    assert!(store.list_tasks().await.unwrap().is_empty());
    assert!(dir.path().join("data").join("tasks.json").exists());
    assert!(dir.path().join("data").join("assignees.json").exists());
}
