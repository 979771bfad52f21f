//! Advanced Analytics Routes
//!
//! Health reports, creation trends, keyword clouds, and timeseries.
//! All project-scoped and cache-backed.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthedProject;
use crate::services::analytics_service;
use crate::state::AppState;
use crate::types::{self, ExportParams, TimeseriesParams, TrendParams};

/// GET /api/advanced/health-report - 0-100 health score with
/// recommendations.
pub async fn health_report(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
) -> ApiResult<impl IntoResponse> {
    let report = analytics_service::health_report(&state, &project.project_id).await?;
    Ok(types::ok("Health report generated", report))
}

/// GET /api/advanced/trends?granularity=daily|weekly|monthly
pub async fn trends(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
    Query(params): Query<TrendParams>,
) -> ApiResult<impl IntoResponse> {
    let points =
        analytics_service::trends(&state, &project.project_id, params.granularity.as_deref())
            .await?;
    Ok(types::ok("Trends computed", points))
}

/// GET /api/advanced/keywords - Most frequent words across titles and
/// messages.
pub async fn keywords(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
) -> ApiResult<impl IntoResponse> {
    let entries = analytics_service::keywords(&state, &project.project_id).await?;
    Ok(types::ok("Keywords extracted", entries))
}

/// GET /api/advanced/timeseries?days=N - Day-bucketed report counts for
/// the trailing window.
pub async fn timeseries(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
    Query(params): Query<TimeseriesParams>,
) -> ApiResult<impl IntoResponse> {
    let points = analytics_service::timeseries(&state, &project.project_id, params.days).await?;
    Ok(types::ok("Timeseries computed", points))
}

/// GET /api/advanced/aggregated-stats - Summary counts plus error-code
/// and top-bug rankings.
pub async fn aggregated_stats(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
) -> ApiResult<impl IntoResponse> {
    let agg = analytics_service::aggregated_stats(&state, &project.project_id).await?;
    Ok(types::ok("Aggregated stats computed", agg))
}

/// GET /api/advanced/export?format=json|csv - Dump the project's records
/// (newest first, capped). CSV replies are raw; JSON replies use the
/// standard envelope.
pub async fn export(
    State(state): State<AppState>,
    AuthedProject(project): AuthedProject,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    let format = params.format.as_deref().unwrap_or("json");
    let records = analytics_service::export_records(&state, &project.project_id).await?;

    match format {
        "json" => Ok(types::ok("Export generated", records).into_response()),
        "csv" => {
            let body = analytics_service::to_csv(&records);
            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"bugs.csv\"",
                    ),
                ],
                body,
            )
                .into_response())
        }
        _ => Err(ApiError::invalid_format("format", "one of json, csv")),
    }
}
