//! REST route handlers and router assembly.

pub mod admin;
pub mod advanced;
pub mod bugs;
pub mod health;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::{auth_middleware, rate_limit_middleware};
use crate::state::AppState;

/// Assemble the full application router.
///
/// Three surfaces:
/// - `/health` and `/health/deep`: public liveness and dependency probes
/// - `/api/...`: project endpoints behind API-key auth + rate limiting
/// - `/api/admin/...`: maintenance and cross-project endpoints behind
///   the admin token
pub fn create_api_router(state: AppState) -> Router {
    let project_routes = Router::new()
        .route("/api/bugs/report", post(bugs::submit_report))
        .route("/api/bugs/report/batch", post(bugs::submit_batch))
        .route("/api/bugs", get(bugs::list_bugs))
        .route("/api/bugs/search", get(bugs::search))
        .route("/api/bugs/stats", get(bugs::stats))
        .route("/api/bugs/:bug_id", get(bugs::get_bug))
        .route("/api/bugs/:bug_id/solution", patch(bugs::update_solution))
        .route("/api/advanced/health-report", get(advanced::health_report))
        .route("/api/advanced/trends", get(advanced::trends))
        .route("/api/advanced/keywords", get(advanced::keywords))
        .route("/api/advanced/timeseries", get(advanced::timeseries))
        .route(
            "/api/advanced/aggregated-stats",
            get(advanced::aggregated_stats),
        )
        .route("/api/advanced/export", get(advanced::export))
        // Layer order: auth runs first, then the rate limiter sees the
        // authenticated project in extensions.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/api/admin/maintenance/merge", post(admin::merge_duplicates))
        .route(
            "/api/admin/maintenance/archive",
            post(admin::archive_resolved),
        )
        .route("/api/admin/analytics/comparison", get(admin::comparison))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin::admin_auth_middleware,
        ));

    let cors = if state.config.cors_origins.is_empty() {
        // Dev mode: allow all origins.
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(health::health))
        .route("/health/deep", get(health::health_deep))
        .merge(project_routes)
        .merge(admin_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
