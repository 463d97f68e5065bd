//! Shared helpers for revive-import integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use revive_common::config::ImportConfig;
use revive_common::events::EventBus;
use serde_json::Value;
use tower::ServiceExt;

use revive_import::{build_router, AppState};

/// App state over a fresh in-memory database
pub async fn test_app_state(import: ImportConfig) -> AppState {
    let db_pool = revive_import::db::init_memory_pool().await.unwrap();
    AppState::new(db_pool, EventBus::new(100), import, "test".to_string())
}

pub async fn test_app() -> (AppState, Router) {
    test_app_with(ImportConfig::default()).await
}

pub async fn test_app_with(import: ImportConfig) -> (AppState, Router) {
    let state = test_app_state(import).await;
    let app = build_router(state.clone());
    (state, app)
}

/// Send a request, returning status and parsed JSON body (`Null` if empty)
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Create a session for `owner_id` and return its id
pub async fn create_session(app: &Router, owner_id: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/import/sessions",
        Some(serde_json::json!({ "owner_id": owner_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

pub async fn upload(app: &Router, session_id: &str, file_name: &str, content: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/import/sessions/{}/upload", session_id),
        Some(serde_json::json!({ "file_name": file_name, "content": content })),
    )
    .await
}

/// Poll the session until it leaves `IMPORTING`
pub async fn wait_for_import(app: &Router, session_id: &str) -> Value {
    for _ in 0..200 {
        let (_, body) = send(app, Method::GET, &format!("/import/sessions/{}", session_id), None).await;
        if body["state"] != "IMPORTING" {
            return body;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("import did not finish in time");
}

/// CSV with `n` valid rows
pub fn leads_csv(n: usize) -> String {
    let mut text = String::from("first_name,last_name,email,company");
    for i in 0..n {
        text.push_str(&format!("\nLead,Number{},lead{}@example.com,Acme", i, i));
    }
    text
}
