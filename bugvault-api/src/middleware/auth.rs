//! Axum Middleware for API-Key Authentication
//!
//! This middleware:
//! - Reads the `x-api-key` header and shape-checks it before any lookup
//! - Resolves the key against the project directory
//! - Rejects suspended and disabled projects
//! - Injects the resolved `Project` into request extensions
//! - Returns 401 for unauthenticated requests
//!
//! Handlers receive the project via the `AuthedProject` extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use bugvault_core::{is_valid_api_key, Project};

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

/// Authenticate a request by API key and attach the owning project.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let api_key = request
        .headers()
        .get("x-api-key")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing x-api-key header"))?;

    // Cheap shape check before touching the directory.
    if !is_valid_api_key(api_key) {
        return Err(ApiError::invalid_api_key());
    }

    let project = state
        .projects
        .find_by_api_key(api_key)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(ApiError::invalid_api_key)?;

    if !project.is_active() {
        return Err(ApiError::project_inactive(&project.project_id));
    }

    request.extensions_mut().insert(project);
    Ok(next.run(request).await)
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Extractor handing route handlers the authenticated project.
///
/// Only usable behind `auth_middleware`; elsewhere it rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthedProject(pub Project);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthedProject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Project>()
            .cloned()
            .map(AuthedProject)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
