//! Admin Maintenance Routes
//!
//! Manual triggers for the duplicate-merge and archive passes. Guarded by
//! a shared admin token rather than project API keys: both passes operate
//! across every project.

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, ApiResult};
use crate::services::{analytics_service, maintenance};
use crate::state::AppState;
use crate::types::{self, ComparisonParams};

/// Gate on the `x-admin-token` header. With no token configured the
/// admin surface is disabled outright.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Err(ApiError::unauthorized("Admin endpoints are disabled"));
    };

    let presented = request
        .headers()
        .get("x-admin-token")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing x-admin-token header"))?;

    if presented != expected {
        return Err(ApiError::unauthorized("Invalid admin token"));
    }

    Ok(next.run(request).await)
}

/// POST /api/admin/maintenance/merge - Collapse records sharing a dedup
/// signature into their earliest-created member.
pub async fn merge_duplicates(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let outcome = maintenance::merge_duplicates(&state).await?;
    Ok(types::ok("Duplicate merge completed", outcome))
}

/// POST /api/admin/maintenance/archive - Move old resolved bugs to cold
/// storage.
pub async fn archive_resolved(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let outcome = maintenance::archive_resolved(&state).await?;
    Ok(types::ok("Archive pass completed", outcome))
}

/// GET /api/admin/analytics/comparison?projects=a,b - Health-score
/// comparison across projects. Admin-only: project keys never see other
/// tenants' numbers.
pub async fn comparison(
    State(state): State<AppState>,
    Query(params): Query<ComparisonParams>,
) -> ApiResult<impl IntoResponse> {
    let entries = analytics_service::comparison(&state, params.projects.as_deref()).await?;
    Ok(types::ok("Comparison computed", entries))
}
