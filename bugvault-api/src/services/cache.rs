//! Cache key construction and read/write helpers.
//!
//! Every key embeds the project id so a single glob
//! (`search:*<project>*`) can invalidate a project's search pages.
//! Cache failures never fail a request: reads fall through to storage
//! and writes are logged at warn and dropped.

use std::fmt::Write as _;
use std::sync::Arc;

use bugvault_core::timefmt;
use bugvault_storage::{Cache, SearchQuery};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

// ============================================================================
// KEY BUILDERS
// ============================================================================

pub fn stats_key(project_id: &str) -> String {
    format!("stats:{project_id}")
}

pub fn agg_stats_key(project_id: &str) -> String {
    format!("agg_stats:{project_id}")
}

pub fn trend_key(project_id: &str, granularity: &str) -> String {
    format!("trend:{project_id}:{granularity}")
}

pub fn keywords_key(project_id: &str) -> String {
    format!("keywords:{project_id}")
}

pub fn health_key(project_id: &str) -> String {
    format!("health_report:{project_id}")
}

pub fn timeseries_key(project_id: &str, days: i64) -> String {
    format!("timeseries:{project_id}:{days}")
}

fn push_part(key: &mut String, part: &str) {
    // Writing to a String cannot fail.
    let _ = write!(key, ":{}:{}", part.len(), part);
}

/// Key for one search result page, derived from the normalized query.
/// Every variable-length component is length-prefixed, so a value cannot
/// run into its neighbour; two requests share a key exactly when their
/// normalized queries match.
pub fn search_key(project_id: &str, query: &SearchQuery) -> String {
    let severities = query
        .severities
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let statuses = query
        .statuses
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let from = query.created_from.as_ref().map(timefmt::format);
    let to = query.created_to.as_ref().map(timefmt::format);

    let mut key = format!("search:{project_id}");
    push_part(&mut key, query.text.as_deref().unwrap_or(""));
    push_part(&mut key, &severities);
    push_part(&mut key, &statuses);
    push_part(&mut key, query.error_code.as_deref().unwrap_or(""));
    push_part(&mut key, from.as_deref().unwrap_or(""));
    push_part(&mut key, to.as_deref().unwrap_or(""));
    // minOccurrences is validated >= 1, so 0 is free as "absent".
    let _ = write!(
        key,
        ":{}:{}:{}",
        query.min_occurrences.unwrap_or(0),
        query.limit,
        query.offset
    );
    key
}

/// Glob matching every search page of a project.
pub fn search_pattern(project_id: &str) -> String {
    format!("search:*{project_id}*")
}

// ============================================================================
// READ / WRITE HELPERS
// ============================================================================

/// Fetch and deserialize a cached value. Any cache or decode failure is
/// treated as a miss.
pub async fn get_json<T: DeserializeOwned>(cache: &Arc<dyn Cache>, key: &str) -> Option<T> {
    match cache.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, %err, "dropping undecodable cache entry");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            warn!(key, %err, "cache read failed");
            None
        }
    }
}

/// Serialize and store a value with a TTL. Failures are logged and dropped.
pub async fn put_json<T: Serialize>(cache: &Arc<dyn Cache>, key: &str, value: &T, ttl_secs: u64) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(key, %err, "failed to serialize cache value");
            return;
        }
    };
    if let Err(err) = cache.set_with_ttl(key, &raw, ttl_secs).await {
        warn!(key, %err, "cache write failed");
    }
}

/// Invalidate a project's cached reads after a mutation: every search
/// page plus the stats summary. Analytics keys age out on TTL alone.
pub async fn invalidate_project(cache: &Arc<dyn Cache>, project_id: &str) {
    if let Err(err) = cache.delete_by_pattern(&search_pattern(project_id)).await {
        warn!(project_id, %err, "search cache invalidation failed");
    }
    if let Err(err) = cache.delete(&stats_key(project_id)).await {
        warn!(project_id, %err, "stats cache invalidation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bugvault_storage::InMemoryCache;

    fn text_query(text: &str) -> SearchQuery {
        SearchQuery {
            text: Some(text.to_string()),
            limit: 10,
            offset: 0,
            ..SearchQuery::default()
        }
    }

    #[test]
    fn test_search_key_embeds_project_id() {
        let key = search_key("proj_1", &text_query("timeout"));
        assert!(key.starts_with("search:proj_1"));
    }

    #[test]
    fn test_search_key_distinguishes_facet_presence() {
        let bare = text_query("db");

        // An error-code facet, even one matching nothing, is a different
        // query and must not share the bare query's key.
        let mut with_code = text_query("db");
        with_code.error_code = Some("-".to_string());
        assert_ne!(search_key("proj_1", &bare), search_key("proj_1", &with_code));

        // A crafted value cannot masquerade as two neighbouring
        // components.
        let mut sneaky = text_query("db");
        sneaky.error_code = Some("0::0:".to_string());
        assert_ne!(search_key("proj_1", &bare), search_key("proj_1", &sneaky));
    }

    #[tokio::test]
    async fn test_invalidate_project_scope() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let query = text_query("q");
        put_json(&cache, &stats_key("proj_1"), &1, 300).await;
        put_json(&cache, &search_key("proj_1", &query), &2, 300).await;
        put_json(&cache, &stats_key("proj_2"), &3, 300).await;

        invalidate_project(&cache, "proj_1").await;

        assert_eq!(get_json::<i32>(&cache, &stats_key("proj_1")).await, None);
        assert_eq!(
            get_json::<i32>(&cache, &search_key("proj_1", &query)).await,
            None
        );
        assert_eq!(get_json::<i32>(&cache, &stats_key("proj_2")).await, Some(3));
    }
}
