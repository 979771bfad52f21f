//! Axum middleware: API-key authentication and fixed-window rate limiting.

pub mod auth;
pub mod rate_limit;

pub use auth::{auth_middleware, AuthedProject};
pub use rate_limit::rate_limit_middleware;
