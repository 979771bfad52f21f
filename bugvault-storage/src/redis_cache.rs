//! Redis backend for the cache trait.
//!
//! Uses a `ConnectionManager` (multiplexed, auto-reconnecting); each call
//! clones the manager handle, which is cheap. Pattern invalidation uses
//! `KEYS` + `DEL`: the keyspace holds one entry per cached query shape per
//! project, small enough that a scan is not a concern.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::info;

use crate::error::StorageError;
use crate::traits::Cache;

/// Connection settings for the cache.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

/// Redis-backed cache and rate-limit counters.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

fn backend_err(err: redis::RedisError) -> StorageError {
    if err.is_connection_refusal() || err.is_connection_dropped() || err.is_timeout() {
        StorageError::Unavailable(err.to_string())
    } else {
        StorageError::Backend(err.to_string())
    }
}

impl RedisCache {
    /// Connect and perform the initial handshake. Fails with
    /// `StorageError::Unavailable` when the server cannot be reached.
    pub async fn connect(config: &RedisConfig) -> Result<Self, StorageError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        info!("connected to cache");
        Ok(Self { manager })
    }

    /// Round-trip a PING to confirm the handshake.
    pub async fn ping(&self) -> Result<(), StorageError> {
        let mut con = self.manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut con)
            .await
            .map_err(backend_err)?;
        Ok(())
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut con = self.manager.clone();
        con.get(key).await.map_err(backend_err)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), StorageError> {
        let mut con = self.manager.clone();
        con.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(backend_err)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut con = self.manager.clone();
        con.del::<_, ()>(key).await.map_err(backend_err)
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, StorageError> {
        let mut con = self.manager.clone();
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut con)
            .await
            .map_err(backend_err)?;
        if keys.is_empty() {
            return Ok(0);
        }
        let removed: u64 = con.del(keys).await.map_err(backend_err)?;
        Ok(removed)
    }

    async fn increment(&self, key: &str) -> Result<i64, StorageError> {
        let mut con = self.manager.clone();
        con.incr(key, 1).await.map_err(backend_err)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StorageError> {
        let mut con = self.manager.clone();
        con.expire::<_, ()>(key, ttl_secs as i64)
            .await
            .map_err(backend_err)
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, StorageError> {
        let mut con = self.manager.clone();
        let remaining: i64 = con.ttl(key).await.map_err(backend_err)?;
        // -2 means the key is absent, -1 means it has no expiry.
        if remaining < 0 {
            Ok(None)
        } else {
            Ok(Some(remaining as u64))
        }
    }
}
