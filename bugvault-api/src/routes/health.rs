//! Health Routes
//!
//! `/health` is a plain liveness probe: it always answers 200 as long as
//! the process serves requests. `/health/deep` additionally probes each
//! backend and answers 503 when any is down, for load-balancer readiness
//! checks.

use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types;

/// Per-dependency probe outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub store: String,
    pub cache: String,
}

/// Liveness response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub uptime_secs: u64,
}

/// Deep probe response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepHealthStatus {
    pub status: String,
    pub uptime_secs: u64,
    pub dependencies: DependencyStatus,
}

/// GET /health - Liveness.
pub async fn health(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = HealthStatus {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    };
    Ok(types::ok("Health checked", body))
}

/// GET /health/deep - Liveness plus dependency checks.
pub async fn health_deep(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    // Probe with real (cheap) operations rather than connection state.
    let store_ok = state
        .bugs
        .find_by_id("BUG-00000000-HEALTH")
        .await
        .is_ok();
    let cache_ok = state.cache.get("health:probe").await.is_ok();

    let healthy = store_ok && cache_ok;
    let body = DeepHealthStatus {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        dependencies: DependencyStatus {
            store: if store_ok { "ok" } else { "down" }.to_string(),
            cache: if cache_ok { "ok" } else { "down" }.to_string(),
        },
    };

    let status = if healthy {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };
    Ok(types::with_status(status, "Health checked", body))
}
