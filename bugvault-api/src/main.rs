//! BugVault API Server Entry Point
//!
//! Bootstraps configuration, connects the storage backends, and starts
//! the Axum HTTP server. `BUGVAULT_STORAGE=mongo` selects MongoDB + Redis;
//! anything else runs fully in memory (with a seeded dev project).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use bugvault_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState};
use bugvault_core::{generate_api_key, generate_project_id, Project, ProjectStatus};
use bugvault_storage::{MongoConfig, MongoStore, RedisCache, RedisConfig};
use chrono::Utc;

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ApiConfig::from_env();
    let storage_mode =
        std::env::var("BUGVAULT_STORAGE").unwrap_or_else(|_| "memory".to_string());

    let state = if storage_mode == "mongo" {
        let mongo_defaults = MongoConfig::default();
        let mongo_config = MongoConfig {
            uri: std::env::var("BUGVAULT_MONGO_URI").unwrap_or(mongo_defaults.uri),
            database: std::env::var("BUGVAULT_MONGO_DB").unwrap_or(mongo_defaults.database),
        };
        let store = MongoStore::connect(&mongo_config).await?;
        store.ensure_indexes().await?;
        let store = Arc::new(store);

        let redis_config = RedisConfig {
            url: std::env::var("BUGVAULT_REDIS_URL")
                .unwrap_or_else(|_| RedisConfig::default().url),
        };
        let cache = RedisCache::connect(&redis_config).await?;
        cache.ping().await?;
        let cache = Arc::new(cache);

        AppState::new(store.clone(), store.clone(), store, cache, config)
    } else {
        let state = AppState::in_memory(config);
        seed_dev_project(&state).await?;
        state
    };

    let app: Router = create_api_router(state);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, storage = %storage_mode, "Starting BugVault API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// In-memory mode has no out-of-band project provisioning, so seed one
/// dev project and log its key.
async fn seed_dev_project(state: &AppState) -> ApiResult<()> {
    let now = Utc::now();
    let project = Project {
        project_id: generate_project_id(),
        name: "dev".to_string(),
        api_key: generate_api_key(),
        status: ProjectStatus::Active,
        rate_limit: None,
        created_at: now,
        updated_at: now,
    };
    state.projects.insert(&project).await?;
    tracing::info!(
        project_id = %project.project_id,
        api_key = %project.api_key,
        "seeded in-memory dev project"
    );
    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("BUGVAULT_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("BUGVAULT_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
