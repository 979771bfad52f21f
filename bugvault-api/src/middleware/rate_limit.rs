//! Fixed-Window Rate Limiting Middleware
//!
//! One counter per (project, API key) on the cache backend: INCR, with the
//! window TTL attached on the counter's first increment. Over-limit
//! requests get a 429 with a retry hint. Every response carries
//! X-RateLimit-* headers.
//!
//! The limiter fails open: if the cache backend is unreachable, requests
//! pass through rather than blocking ingestion on cache health.

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Response as HttpResponse},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bugvault_core::Project;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

const HEADER_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const HEADER_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const HEADER_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
const HEADER_RETRY_AFTER: HeaderName = HeaderName::from_static("retry-after");

fn counter_key(project: &Project) -> String {
    format!("ratelimit:{}:{}", project.project_id, project.api_key)
}

fn set_header<B>(response: &mut HttpResponse<B>, name: HeaderName, value: u64) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        response.headers_mut().insert(name, value);
    }
}

/// Enforce the per-project request budget for the current window.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.rate_limit_enabled {
        return next.run(request).await;
    }

    // Runs behind auth_middleware; unauthenticated requests never get here.
    let Some(project) = request.extensions().get::<Project>().cloned() else {
        return next.run(request).await;
    };

    let key = counter_key(&project);
    let max = project.rate_limit.unwrap_or(state.config.rate_limit_max) as i64;
    let window_secs = state.config.rate_limit_window.as_secs();

    let count = match state.cache.increment(&key).await {
        Ok(count) => count,
        Err(err) => {
            warn!(project_id = %project.project_id, %err, "rate limiter unavailable, failing open");
            return next.run(request).await;
        }
    };

    if count == 1 {
        if let Err(err) = state.cache.expire(&key, window_secs).await {
            warn!(project_id = %project.project_id, %err, "failed to start rate limit window");
        }
    }

    let reset_secs = match state.cache.ttl(&key).await {
        Ok(Some(remaining)) => remaining,
        _ => window_secs,
    };

    if count > max {
        let mut response = ApiError::too_many_requests(Some(reset_secs))
            .with_details(serde_json::json!({ "retryAfter": reset_secs }))
            .into_response();
        set_header(&mut response, HEADER_LIMIT, max.max(0) as u64);
        set_header(&mut response, HEADER_REMAINING, 0);
        set_header(&mut response, HEADER_RESET, reset_secs);
        set_header(&mut response, HEADER_RETRY_AFTER, reset_secs);
        return response;
    }

    let mut response = next.run(request).await;
    set_header(&mut response, HEADER_LIMIT, max.max(0) as u64);
    set_header(&mut response, HEADER_REMAINING, (max - count).max(0) as u64);
    set_header(&mut response, HEADER_RESET, reset_secs);
    response
}
