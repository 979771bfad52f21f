//! BugVault API - HTTP Layer
//!
//! Axum REST surface over the storage traits: report ingestion with
//! signature dedup, search, analytics, and maintenance. Authentication is
//! per-project API keys; rate limiting is a fixed window per key.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod types;
pub mod validation;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::AppState;
