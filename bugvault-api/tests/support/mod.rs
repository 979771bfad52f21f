//! Shared helpers for integration tests: an in-memory app instance and a
//! request helper that unwraps the response envelope.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bugvault_api::{create_api_router, ApiConfig, AppState};
use bugvault_core::{
    generate_api_key, generate_bug_id, generate_project_id, BugContext, BugRecord, BugStatus,
    Project, ProjectStatus, Severity,
};
use bugvault_storage::{BugStore, ProjectDirectory};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub project: Project,
}

/// App with default config plus an admin token.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(ApiConfig {
        admin_token: Some(ADMIN_TOKEN.to_string()),
        ..ApiConfig::default()
    })
    .await
}

pub async fn spawn_app_with(config: ApiConfig) -> TestApp {
    let state = AppState::in_memory(config);
    let project = seed_project(&state, "primary", ProjectStatus::Active).await;
    TestApp {
        router: create_api_router(state.clone()),
        state,
        project,
    }
}

/// Insert a project directly into the directory.
pub async fn seed_project(state: &AppState, name: &str, status: ProjectStatus) -> Project {
    let now = Utc::now();
    let project = Project {
        project_id: generate_project_id(),
        name: name.to_string(),
        api_key: generate_api_key(),
        status,
        rate_limit: None,
        created_at: now,
        updated_at: now,
    };
    state
        .projects
        .insert(&project)
        .await
        .expect("seed project");
    project
}

/// Insert a bug record directly into the store, bypassing the API.
pub async fn seed_bug(state: &AppState, record: &BugRecord) {
    state.bugs.insert(record).await.expect("seed bug");
}

/// A well-formed bug record for direct seeding.
pub fn make_bug(project_id: &str, error_code: &str, occurrences: i64) -> BugRecord {
    let now = Utc::now();
    BugRecord {
        bug_id: generate_bug_id(now),
        project_id: project_id.to_string(),
        error_code: error_code.to_string(),
        title: format!("{error_code} failure"),
        message: "something broke".to_string(),
        severity: Severity::Medium,
        stack_trace: None,
        context: BugContext::new(),
        occurrences,
        status: BugStatus::Open,
        solution: None,
        created_at: now,
        updated_at: now,
    }
}

/// A well-formed single report body.
pub fn report_body(error_code: &str) -> Value {
    json!({
        "errorCode": error_code,
        "title": "Checkout crashes",
        "message": "cart was empty",
        "severity": "high",
    })
}

/// Send a request and decode the JSON body (if any).
pub async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

/// Send an admin request, optionally carrying a token.
pub async fn send_admin(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-admin-token", token);
    }
    let request = builder.body(Body::empty()).expect("request");
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, serde_json::from_slice(&bytes).expect("json body"))
}
