//! BugVault Storage - Persistence Layer
//!
//! Async traits for the bug store, archive, project directory, and cache,
//! plus three backend families:
//!
//! - `memory`: lock-based in-process implementations used by tests and
//!   single-node deployments
//! - `mongo`: MongoDB-backed bug store, archive, and project directory
//! - `redis_cache`: Redis-backed cache and rate-limit counters
//!
//! The API layer depends only on the traits and is handed `Arc<dyn ...>`
//! handles at startup.

mod error;
pub mod memory;
pub mod mongo;
pub mod redis_cache;
mod traits;

pub use error::StorageError;
pub use memory::{InMemoryBugArchive, InMemoryBugStore, InMemoryCache, InMemoryProjectDirectory};
pub use mongo::{MongoConfig, MongoStore};
pub use redis_cache::{RedisCache, RedisConfig};
pub use traits::{
    BugArchive, BugPage, BugStore, Cache, ProjectDirectory, RecurrenceUpdate, SearchQuery,
    StatsSummary,
};
