//! Shared application state for Axum routers.

use std::sync::Arc;

use bugvault_storage::{
    BugArchive, BugStore, Cache, InMemoryBugArchive, InMemoryBugStore, InMemoryCache,
    InMemoryProjectDirectory, ProjectDirectory,
};

use crate::config::ApiConfig;

/// Application-wide state shared across all routes.
///
/// Routes and services see only the storage traits; which backend family
/// is in use (in-memory or MongoDB + Redis) is decided once at startup.
#[derive(Clone)]
pub struct AppState {
    pub bugs: Arc<dyn BugStore>,
    pub archive: Arc<dyn BugArchive>,
    pub projects: Arc<dyn ProjectDirectory>,
    pub cache: Arc<dyn Cache>,
    pub config: Arc<ApiConfig>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        bugs: Arc<dyn BugStore>,
        archive: Arc<dyn BugArchive>,
        projects: Arc<dyn ProjectDirectory>,
        cache: Arc<dyn Cache>,
        config: ApiConfig,
    ) -> Self {
        Self {
            bugs,
            archive,
            projects,
            cache,
            config: Arc::new(config),
            start_time: std::time::Instant::now(),
        }
    }

    /// State backed entirely by in-memory stores. Used by tests and by
    /// single-node deployments without external services.
    pub fn in_memory(config: ApiConfig) -> Self {
        Self::new(
            Arc::new(InMemoryBugStore::new()),
            Arc::new(InMemoryBugArchive::new()),
            Arc::new(InMemoryProjectDirectory::new()),
            Arc::new(InMemoryCache::new()),
            config,
        )
    }
}
