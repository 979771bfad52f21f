//! Business logic behind the route handlers.
//!
//! Routes stay thin: they authenticate, parse parameters, and delegate
//! here. Services own dedup, search, analytics, maintenance, and the
//! caching that surrounds them.

pub mod analytics_service;
pub mod bug_service;
pub mod cache;
pub mod maintenance;
pub mod search_service;
