//! Bug REST Routes
//!
//! Ingestion (single and batch), listing, search, stats, and solution
//! updates. All handlers are project-scoped via the `AuthedProject`
//! extractor and delegate to the service layer.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::error::ApiResult;
use crate::middleware::AuthedProject;
use crate::services::{analytics_service, bug_service, search_service};
use crate::state::AppState;
use crate::types::{
    self, BatchReportRequest, ListParams, ReportAck, ReportRequest, SearchParams,
    SolutionUpdateRequest,
};
use crate::validation;

// ============================================================================
// INGESTION
// ============================================================================

/// POST /api/bugs/report - Submit one error report.
///
/// 201 for both a first sighting and a recurrence; the message and
/// occurrence count say which. The body is a short ack, not the full
/// record.
pub async fn submit_report(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
    Json(req): Json<ReportRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = bug_service::submit_report(&state, &project.project_id, &req).await?;
    let message = if outcome.is_created() {
        "Bug report created"
    } else {
        "Occurrence recorded"
    };
    Ok(types::created(message, ReportAck::from(outcome.record())))
}

/// POST /api/bugs/report/batch - Submit up to the configured cap of
/// reports in one request. Always 207: per-item outcomes are in the body.
pub async fn submit_batch(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
    Json(req): Json<BatchReportRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = bug_service::submit_batch(&state, &project.project_id, &req).await?;
    Ok(types::with_status(
        StatusCode::MULTI_STATUS,
        "Batch processed",
        outcome,
    ))
}

// ============================================================================
// READS
// ============================================================================

/// GET /api/bugs - Page through the project's records, newest first.
pub async fn list_bugs(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
    Query(params): Query<ListParams>,
) -> ApiResult<impl IntoResponse> {
    let (limit, offset) = validation::validate_list_params(&params)?;
    let page = bug_service::list_bugs(&state, &project.project_id, limit, offset).await?;
    Ok(types::ok("Bugs retrieved", page))
}

/// GET /api/bugs/search - Free-text search with facets.
pub async fn search(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
    Query(params): Query<SearchParams>,
) -> ApiResult<impl IntoResponse> {
    let page = search_service::search(&state, &project.project_id, &params).await?;
    Ok(types::ok("Search results", page))
}

/// GET /api/bugs/stats - Per-severity and per-status counts.
pub async fn stats(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
) -> ApiResult<impl IntoResponse> {
    let summary = analytics_service::stats(&state, &project.project_id).await?;
    Ok(types::ok("Stats retrieved", summary))
}

/// GET /api/bugs/:bug_id - Fetch one bug. Records of other projects read
/// as 404.
pub async fn get_bug(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
    Path(bug_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let record = bug_service::get_bug(&state, &project.project_id, &bug_id).await?;
    Ok(types::ok("Bug retrieved", record))
}

// ============================================================================
// SOLUTION UPDATES
// ============================================================================

/// PATCH /api/bugs/:bug_id/solution - Merge solution fields and update
/// the status.
pub async fn update_solution(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
    Path(bug_id): Path<String>,
    Json(req): Json<SolutionUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let record = bug_service::update_solution(&state, &project.project_id, &bug_id, &req).await?;
    Ok(types::ok("Solution updated", record))
}
