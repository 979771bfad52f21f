//! Batch ingestion, rate limiting, admin maintenance and comparison
//! endpoints, and the public health probes.

mod support;

use axum::http::StatusCode;
use bugvault_api::ApiConfig;
use bugvault_core::{BugStatus, ProjectStatus, Severity};
use bugvault_storage::BugArchive;
use chrono::{Duration, Utc};
use serde_json::json;
use support::{
    make_bug, report_body, seed_bug, seed_project, send, send_admin, spawn_app, spawn_app_with,
    ADMIN_TOKEN,
};

// ============================================================================
// BATCH INGESTION
// ============================================================================

#[tokio::test]
async fn test_batch_over_cap_is_rejected_wholesale() {
    let app = spawn_app().await;
    let key = app.project.api_key.clone();

    let bugs: Vec<_> = (0..21).map(|i| report_body(&format!("E_{}", i))).collect();
    let (status, body) = send(
        &app,
        "POST",
        "/api/bugs/report/batch",
        Some(&key),
        Some(json!({ "bugs": bugs })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    // Nothing from the oversized batch was ingested.
    let (_, body) = send(&app, "GET", "/api/bugs", Some(&key), None).await;
    assert_eq!(body["data"]["pagination"]["total"], json!(0));
}

#[tokio::test]
async fn test_batch_isolates_bad_items() {
    let app = spawn_app().await;
    let key = app.project.api_key.clone();

    let bugs = vec![
        report_body("E_GOOD_ONE"),
        json!({"errorCode": "bad code", "title": "t", "message": "m", "severity": "low"}),
        report_body("E_GOOD_TWO"),
    ];
    let (status, body) = send(
        &app,
        "POST",
        "/api/bugs/report/batch",
        Some(&key),
        Some(json!({ "bugs": bugs })),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(body["data"]["summary"], json!({"total": 3, "successful": 2, "failed": 1}));

    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results[0]["success"], json!(true));
    assert!(results[0]["bugId"].is_string());
    assert_eq!(results[1]["success"], json!(false));
    assert!(results[1]["bugId"].is_null());
    assert_eq!(results[2]["success"], json!(true));

    let (_, body) = send(&app, "GET", "/api/bugs", Some(&key), None).await;
    assert_eq!(body["data"]["pagination"]["total"], json!(2));
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let app = spawn_app().await;
    let key = app.project.api_key.clone();

    let (status, body) = send(
        &app,
        "POST",
        "/api/bugs/report/batch",
        Some(&key),
        Some(json!({ "bugs": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("MISSING_FIELD"));

    // The field itself must be spelled "bugs".
    let (status, body) = send(
        &app,
        "POST",
        "/api/bugs/report/batch",
        Some(&key),
        Some(json!({ "reports": [report_body("E_WRONG_FIELD")] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("MISSING_FIELD"));
}

// ============================================================================
// RATE LIMITING
// ============================================================================

#[tokio::test]
async fn test_rate_limit_caps_requests_per_window() {
    let app = spawn_app_with(ApiConfig {
        rate_limit_max: 3,
        admin_token: Some(ADMIN_TOKEN.to_string()),
        ..ApiConfig::default()
    })
    .await;
    let key = app.project.api_key.clone();

    for _ in 0..3 {
        let (status, body) = send(&app, "GET", "/api/bugs", Some(&key), None).await;
        assert_eq!(status, StatusCode::OK, "unexpected limit: {body}");
    }

    let (status, body) = send(&app, "GET", "/api/bugs", Some(&key), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], json!("TOO_MANY_REQUESTS"));
    assert!(body["error"]["details"]["retryAfter"].is_u64());
}

#[tokio::test]
async fn test_rate_limit_headers_present() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let app = spawn_app_with(ApiConfig {
        rate_limit_max: 5,
        ..ApiConfig::default()
    })
    .await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/bugs")
        .header("x-api-key", &app.project.api_key)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "5");
    assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "4");
    assert!(headers.contains_key("x-ratelimit-reset"));
}

// ============================================================================
// DUPLICATE MERGE
// ============================================================================

#[tokio::test]
async fn test_merge_collapses_racing_duplicates() {
    let app = spawn_app().await;
    let key = app.project.api_key.clone();
    let project_id = app.project.project_id.clone();

    // Three records with one signature, as left behind by racing first
    // reports. The earliest becomes the primary.
    let now = Utc::now();
    let mut earliest = make_bug(&project_id, "RACE_CODE", 3);
    earliest.created_at = now - Duration::hours(3);
    let mut middle = make_bug(&project_id, "RACE_CODE", 5);
    middle.created_at = now - Duration::hours(2);
    let mut latest = make_bug(&project_id, "RACE_CODE", 2);
    latest.created_at = now - Duration::hours(1);
    for record in [&earliest, &middle, &latest] {
        seed_bug(&app.state, record).await;
    }

    let (status, body) = send_admin(
        &app,
        "POST",
        "/api/admin/maintenance/merge",
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["groupsMerged"], json!(1));
    assert_eq!(body["data"]["recordsRemoved"], json!(2));

    // Primary absorbed the total; the rest are gone.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/bugs/{}", earliest.bug_id),
        Some(&key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["occurrences"], json!(10));

    for gone in [&middle.bug_id, &latest.bug_id] {
        let (status, _) = send(&app, "GET", &format!("/api/bugs/{}", gone), Some(&key), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // A second pass finds nothing to do.
    let (_, body) =
        send_admin(&app, "POST", "/api/admin/maintenance/merge", Some(ADMIN_TOKEN)).await;
    assert_eq!(body["data"]["groupsMerged"], json!(0));
}

// ============================================================================
// ARCHIVAL
// ============================================================================

#[tokio::test]
async fn test_archive_moves_old_resolved_bugs() {
    let app = spawn_app().await;
    let key = app.project.api_key.clone();
    let project_id = app.project.project_id.clone();

    let now = Utc::now();
    let mut stale = make_bug(&project_id, "OLD_RESOLVED", 4);
    stale.status = BugStatus::Resolved;
    stale.updated_at = now - Duration::days(91);
    let mut fresh = make_bug(&project_id, "NEW_RESOLVED", 1);
    fresh.status = BugStatus::Resolved;
    fresh.updated_at = now - Duration::days(89);
    let mut open = make_bug(&project_id, "OLD_OPEN", 1);
    open.updated_at = now - Duration::days(120);
    for record in [&stale, &fresh, &open] {
        seed_bug(&app.state, record).await;
    }

    let (status, body) = send_admin(
        &app,
        "POST",
        "/api/admin/maintenance/archive",
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["archived"], json!(1));

    // The archived record left the primary store but survives in the
    // archive with its full payload.
    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/bugs/{}", stale.bug_id),
        Some(&key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let archived = app.state.archive.list_by_project(&project_id).await.unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].record.bug_id, stale.bug_id);
    assert_eq!(archived[0].record.occurrences, 4);

    // Recently resolved and still-open records stay put.
    for kept in [&fresh.bug_id, &open.bug_id] {
        let (status, _) = send(&app, "GET", &format!("/api/bugs/{}", kept), Some(&key), None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

// ============================================================================
// ADMIN AUTH
// ============================================================================

#[tokio::test]
async fn test_admin_endpoints_require_token() {
    let app = spawn_app().await;

    let (status, _) = send_admin(&app, "POST", "/api/admin/maintenance/merge", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        send_admin(&app, "POST", "/api/admin/maintenance/merge", Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // With no token configured the surface is disabled even for the right
    // header.
    let disabled = spawn_app_with(ApiConfig::default()).await;
    let (status, _) = send_admin(
        &disabled,
        "POST",
        "/api/admin/maintenance/merge",
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// CROSS-PROJECT COMPARISON
// ============================================================================

#[tokio::test]
async fn test_comparison_ranks_projects_by_score() {
    let app = spawn_app().await;
    let healthy = app.project.project_id.clone();

    // A second project with unresolved criticals scores below the empty
    // one.
    let risky = seed_project(&app.state, "risky", ProjectStatus::Active).await;
    let mut critical = make_bug(&risky.project_id, "HARD_CRASH", 6);
    critical.severity = Severity::Critical;
    seed_bug(&app.state, &critical).await;
    seed_bug(&app.state, &make_bug(&risky.project_id, "SOFT_FAIL", 1)).await;

    let uri = format!(
        "/api/admin/analytics/comparison?projects={},{}",
        healthy, risky.project_id
    );
    let (status, body) = send_admin(&app, "GET", &uri, Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    // Sorted by score descending.
    assert_eq!(entries[0]["projectId"], json!(healthy));
    assert_eq!(entries[0]["score"], json!(100));
    assert_eq!(entries[1]["projectId"], json!(risky.project_id));
    assert!(entries[1]["score"].as_u64().unwrap() < 100);
    assert_eq!(entries[1]["stats"]["critical"], json!(1));

    // An empty project list is a 400.
    let (status, _) =
        send_admin(&app, "GET", "/api/admin/analytics/comparison", Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // More than ten projects is a 400.
    let crowd: Vec<String> = (0..11).map(|i| format!("proj_{i:08}")).collect();
    let uri = format!("/api/admin/analytics/comparison?projects={}", crowd.join(","));
    let (status, _) = send_admin(&app, "GET", &uri, Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// HEALTH PROBE
// ============================================================================

#[tokio::test]
async fn test_health_probes_are_public() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("ok"));
    assert!(body["data"]["uptimeSecs"].is_u64());

    let (status, body) = send(&app, "GET", "/health/deep", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("ok"));
    assert_eq!(body["data"]["dependencies"]["store"], json!("ok"));
    assert_eq!(body["data"]["dependencies"]["cache"], json!("ok"));
}
