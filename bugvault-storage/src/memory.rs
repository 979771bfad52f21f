//! In-memory backends.
//!
//! Lock-based implementations of every storage trait. Used by the test
//! suite and by single-node deployments that do not need MongoDB or Redis.
//! Semantics mirror the production backends, including lazy TTL expiry and
//! glob invalidation in the cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bugvault_core::{ArchivedBug, BugRecord, BugStatus, Project, Solution, Timestamp};

use crate::error::StorageError;
use crate::traits::{
    BugArchive, BugPage, BugStore, Cache, ProjectDirectory, RecurrenceUpdate, SearchQuery,
    StatsSummary,
};

// ============================================================================
// GLOB MATCHING
// ============================================================================

/// Match a key against a glob pattern where `*` matches any run of
/// characters. No other metacharacters are supported.
fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !key.starts_with(first) {
        return false;
    }

    let mut pos = first.len();
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match key[pos..].find(part) {
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }

    if last.is_empty() {
        return true;
    }
    key.len() >= pos + last.len() && key.ends_with(last)
}

fn page<T: Clone>(items: &[T], limit: i64, offset: i64) -> Vec<T> {
    let offset = offset.max(0) as usize;
    let limit = limit.max(0) as usize;
    items.iter().skip(offset).take(limit).cloned().collect()
}

// ============================================================================
// BUG STORE
// ============================================================================

/// In-memory bug store keyed by bug ID.
#[derive(Default)]
pub struct InMemoryBugStore {
    bugs: Arc<RwLock<HashMap<String, BugRecord>>>,
}

impl InMemoryBugStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record, for test assertions.
    pub fn dump(&self) -> Result<Vec<BugRecord>, StorageError> {
        let bugs = self.bugs.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(bugs.values().cloned().collect())
    }
}

impl Clone for InMemoryBugStore {
    fn clone(&self) -> Self {
        Self {
            bugs: Arc::clone(&self.bugs),
        }
    }
}

fn matches_query(record: &BugRecord, query: &SearchQuery) -> bool {
    if let Some(text) = &query.text {
        let needle = text.to_lowercase();
        let haystack = format!(
            "{} {} {}",
            record.title.to_lowercase(),
            record.message.to_lowercase(),
            record.error_code.to_lowercase()
        );
        if !haystack.contains(&needle) {
            return false;
        }
    }
    if !query.severities.is_empty() && !query.severities.contains(&record.severity) {
        return false;
    }
    if !query.statuses.is_empty() && !query.statuses.contains(&record.status) {
        return false;
    }
    if let Some(code) = &query.error_code {
        if &record.error_code != code {
            return false;
        }
    }
    if let Some(from) = query.created_from {
        if record.created_at < from {
            return false;
        }
    }
    if let Some(to) = query.created_to {
        if record.created_at > to {
            return false;
        }
    }
    if let Some(min) = query.min_occurrences {
        if record.occurrences < min {
            return false;
        }
    }
    true
}

#[async_trait]
impl BugStore for InMemoryBugStore {
    async fn find_by_signature(
        &self,
        project_id: &str,
        error_code: &str,
    ) -> Result<Option<BugRecord>, StorageError> {
        let bugs = self.bugs.read().map_err(|_| StorageError::LockPoisoned)?;
        let found = bugs
            .values()
            .filter(|b| b.project_id == project_id && b.error_code == error_code)
            .min_by_key(|b| b.created_at)
            .cloned();
        Ok(found)
    }

    async fn insert(&self, record: &BugRecord) -> Result<(), StorageError> {
        let mut bugs = self.bugs.write().map_err(|_| StorageError::LockPoisoned)?;
        bugs.insert(record.bug_id.clone(), record.clone());
        Ok(())
    }

    async fn record_recurrence(
        &self,
        bug_id: &str,
        update: &RecurrenceUpdate,
        now: Timestamp,
    ) -> Result<Option<BugRecord>, StorageError> {
        let mut bugs = self.bugs.write().map_err(|_| StorageError::LockPoisoned)?;
        let Some(record) = bugs.get_mut(bug_id) else {
            return Ok(None);
        };
        record.occurrences += 1;
        record.message = update.message.clone();
        record.context = update.context.clone();
        if let Some(trace) = &update.stack_trace {
            record.stack_trace = Some(trace.clone());
        }
        record.updated_at = now;
        Ok(Some(record.clone()))
    }

    async fn apply_solution(
        &self,
        bug_id: &str,
        status: BugStatus,
        solution: &Solution,
        now: Timestamp,
    ) -> Result<Option<BugRecord>, StorageError> {
        let mut bugs = self.bugs.write().map_err(|_| StorageError::LockPoisoned)?;
        let Some(record) = bugs.get_mut(bug_id) else {
            return Ok(None);
        };
        record.status = status;
        record.solution = Some(solution.clone());
        record.updated_at = now;
        Ok(Some(record.clone()))
    }

    async fn find_by_id(&self, bug_id: &str) -> Result<Option<BugRecord>, StorageError> {
        let bugs = self.bugs.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(bugs.get(bug_id).cloned())
    }

    async fn list_by_project(
        &self,
        project_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<BugPage, StorageError> {
        let bugs = self.bugs.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut matched: Vec<BugRecord> = bugs
            .values()
            .filter(|b| b.project_id == project_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matched.len() as u64;
        Ok(BugPage {
            bugs: page(&matched, limit, offset),
            total,
        })
    }

    async fn search(
        &self,
        project_id: &str,
        query: &SearchQuery,
    ) -> Result<BugPage, StorageError> {
        let bugs = self.bugs.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut matched: Vec<BugRecord> = bugs
            .values()
            .filter(|b| b.project_id == project_id && matches_query(b, query))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matched.len() as u64;
        Ok(BugPage {
            bugs: page(&matched, query.limit, query.offset),
            total,
        })
    }

    async fn aggregate_stats(&self, project_id: &str) -> Result<StatsSummary, StorageError> {
        let bugs = self.bugs.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut summary = StatsSummary::default();
        for record in bugs.values().filter(|b| b.project_id == project_id) {
            summary.absorb(record);
        }
        Ok(summary)
    }

    async fn project_records(&self, project_id: &str) -> Result<Vec<BugRecord>, StorageError> {
        let bugs = self.bugs.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut matched: Vec<BugRecord> = bugs
            .values()
            .filter(|b| b.project_id == project_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn duplicate_groups(&self) -> Result<Vec<Vec<BugRecord>>, StorageError> {
        let bugs = self.bugs.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut by_signature: HashMap<(String, String), Vec<BugRecord>> = HashMap::new();
        for record in bugs.values() {
            by_signature
                .entry((record.project_id.clone(), record.error_code.clone()))
                .or_default()
                .push(record.clone());
        }
        let mut groups: Vec<Vec<BugRecord>> = by_signature
            .into_values()
            .filter(|group| group.len() > 1)
            .collect();
        for group in &mut groups {
            group.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        }
        // Deterministic group order for tests and logs.
        groups.sort_by(|a, b| a[0].bug_id.cmp(&b[0].bug_id));
        Ok(groups)
    }

    async fn adjust_occurrences(
        &self,
        bug_id: &str,
        delta: i64,
        now: Timestamp,
    ) -> Result<(), StorageError> {
        let mut bugs = self.bugs.write().map_err(|_| StorageError::LockPoisoned)?;
        if let Some(record) = bugs.get_mut(bug_id) {
            record.occurrences += delta;
            record.updated_at = now;
        }
        Ok(())
    }

    async fn resolved_before(&self, cutoff: Timestamp) -> Result<Vec<BugRecord>, StorageError> {
        let bugs = self.bugs.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut matched: Vec<BugRecord> = bugs
            .values()
            .filter(|b| b.status == BugStatus::Resolved && b.updated_at < cutoff)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(matched)
    }

    async fn delete(&self, bug_id: &str) -> Result<bool, StorageError> {
        let mut bugs = self.bugs.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(bugs.remove(bug_id).is_some())
    }
}

// ============================================================================
// ARCHIVE
// ============================================================================

/// In-memory cold store for archived records.
#[derive(Default)]
pub struct InMemoryBugArchive {
    archived: Arc<RwLock<Vec<ArchivedBug>>>,
}

impl InMemoryBugArchive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clone for InMemoryBugArchive {
    fn clone(&self) -> Self {
        Self {
            archived: Arc::clone(&self.archived),
        }
    }
}

#[async_trait]
impl BugArchive for InMemoryBugArchive {
    async fn store(&self, bug: &ArchivedBug) -> Result<(), StorageError> {
        let mut archived = self
            .archived
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        archived.push(bug.clone());
        Ok(())
    }

    async fn list_by_project(&self, project_id: &str) -> Result<Vec<ArchivedBug>, StorageError> {
        let archived = self
            .archived
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(archived
            .iter()
            .filter(|a| a.record.project_id == project_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// PROJECT DIRECTORY
// ============================================================================

/// In-memory project directory keyed by project ID.
#[derive(Default)]
pub struct InMemoryProjectDirectory {
    projects: Arc<RwLock<HashMap<String, Project>>>,
}

impl InMemoryProjectDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clone for InMemoryProjectDirectory {
    fn clone(&self) -> Self {
        Self {
            projects: Arc::clone(&self.projects),
        }
    }
}

#[async_trait]
impl ProjectDirectory for InMemoryProjectDirectory {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Project>, StorageError> {
        let projects = self
            .projects
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(projects.values().find(|p| p.api_key == api_key).cloned())
    }

    async fn find_by_id(&self, project_id: &str) -> Result<Option<Project>, StorageError> {
        let projects = self
            .projects
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(projects.get(project_id).cloned())
    }

    async fn insert(&self, project: &Project) -> Result<(), StorageError> {
        let mut projects = self
            .projects
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        projects.insert(project.project_id.clone(), project.clone());
        Ok(())
    }
}

// ============================================================================
// CACHE
// ============================================================================

struct CacheEntry {
    value: String,
    /// `None` means no expiry. A TTL of zero expires immediately.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }
}

/// In-memory cache with lazy TTL expiry.
///
/// Expired entries are dropped when touched rather than by a sweeper;
/// the key population is small (one entry per cached query shape).
#[derive(Default)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clone for InMemoryCache {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let doomed: Vec<String> = entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        let removed = doomed.len() as u64;
        for key in doomed {
            entries.remove(&key);
        }
        Ok(removed)
    }

    async fn increment(&self, key: &str) -> Result<i64, StorageError> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let current = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.value.parse::<i64>().unwrap_or(0)
            }
            _ => 0,
        };
        let next = current + 1;
        // A fresh counter starts with no expiry; `expire` attaches one.
        // An existing counter keeps its deadline.
        let expires_at = entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .and_then(|entry| entry.expires_at);
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(Instant::now() + Duration::from_secs(ttl_secs));
        }
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, StorageError> {
        let now = Instant::now();
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Ok(entry
                .expires_at
                .map(|deadline| deadline.duration_since(now).as_secs())),
            _ => Ok(None),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bugvault_core::{BugContext, Severity};
    use chrono::{Duration as ChronoDuration, Utc};

    fn record(bug_id: &str, project_id: &str, error_code: &str) -> BugRecord {
        BugRecord {
            bug_id: bug_id.to_string(),
            project_id: project_id.to_string(),
            error_code: error_code.to_string(),
            title: "Checkout crashes".to_string(),
            message: "cart was empty".to_string(),
            severity: Severity::High,
            stack_trace: None,
            context: BugContext::new(),
            occurrences: 1,
            status: BugStatus::Open,
            solution: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("search:*", "search:proj_1:abc"));
        assert!(glob_match("search:*proj_1*", "search:q=x:proj_1:0:10"));
        assert!(!glob_match("search:*proj_1*", "search:q=x:proj_2:0:10"));
        assert!(glob_match("stats:proj_1", "stats:proj_1"));
        assert!(!glob_match("stats:proj_1", "stats:proj_12"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(!glob_match("a*b*c", "axxbyy"));
    }

    #[tokio::test]
    async fn test_dedup_lookup_finds_earliest() -> Result<(), StorageError> {
        let store = InMemoryBugStore::new();
        let mut older = record("BUG-20260101-AAAAAA", "proj_1", "E_DB");
        older.created_at = Utc::now() - ChronoDuration::hours(2);
        let newer = record("BUG-20260101-BBBBBB", "proj_1", "E_DB");
        store.insert(&newer).await?;
        store.insert(&older).await?;

        let found = store.find_by_signature("proj_1", "E_DB").await?;
        assert_eq!(found.map(|b| b.bug_id), Some("BUG-20260101-AAAAAA".into()));
        assert!(store.find_by_signature("proj_1", "E_OTHER").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_recurrence_preserves_trace_when_absent() -> Result<(), StorageError> {
        let store = InMemoryBugStore::new();
        let mut seeded = record("BUG-20260101-AAAAAA", "proj_1", "E_DB");
        seeded.stack_trace = Some("at main.rs:1".to_string());
        store.insert(&seeded).await?;

        let update = RecurrenceUpdate {
            message: "new message".to_string(),
            context: BugContext::new(),
            stack_trace: None,
        };
        let updated = store
            .record_recurrence("BUG-20260101-AAAAAA", &update, Utc::now())
            .await?
            .ok_or(StorageError::Backend("missing".into()))?;

        assert_eq!(updated.occurrences, 2);
        assert_eq!(updated.message, "new message");
        assert_eq!(updated.stack_trace.as_deref(), Some("at main.rs:1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_search_filters_and_paginates() -> Result<(), StorageError> {
        let store = InMemoryBugStore::new();
        for i in 0..5 {
            let mut r = record(&format!("BUG-20260101-AAAAA{i}"), "proj_1", &format!("E_{i}"));
            r.title = format!("timeout in worker {i}");
            r.created_at = Utc::now() - ChronoDuration::minutes(i);
            store.insert(&r).await?;
        }
        let mut other = record("BUG-20260101-ZZZZZZ", "proj_2", "E_0");
        other.title = "timeout in worker 9".to_string();
        store.insert(&other).await?;

        let query = SearchQuery {
            text: Some("TIMEOUT".to_string()),
            limit: 2,
            offset: 1,
            ..SearchQuery::default()
        };
        let page = store.search("proj_1", &query).await?;
        assert_eq!(page.total, 5);
        assert_eq!(page.bugs.len(), 2);
        // Newest first, so offset 1 skips the most recent record.
        assert_eq!(page.bugs[0].bug_id, "BUG-20260101-AAAAA1");
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_groups_sorted_by_creation() -> Result<(), StorageError> {
        let store = InMemoryBugStore::new();
        let mut first = record("BUG-20260101-AAAAAA", "proj_1", "E_DB");
        first.created_at = Utc::now() - ChronoDuration::hours(3);
        let mut second = record("BUG-20260101-BBBBBB", "proj_1", "E_DB");
        second.created_at = Utc::now() - ChronoDuration::hours(1);
        let lone = record("BUG-20260101-CCCCCC", "proj_1", "E_OTHER");
        store.insert(&second).await?;
        store.insert(&first).await?;
        store.insert(&lone).await?;

        let groups = store.duplicate_groups().await?;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0][0].bug_id, "BUG-20260101-AAAAAA");
        assert_eq!(groups[0][1].bug_id, "BUG-20260101-BBBBBB");
        Ok(())
    }

    #[tokio::test]
    async fn test_resolved_before_cutoff() -> Result<(), StorageError> {
        let store = InMemoryBugStore::new();
        let mut stale = record("BUG-20260101-AAAAAA", "proj_1", "E_A");
        stale.status = BugStatus::Resolved;
        stale.updated_at = Utc::now() - ChronoDuration::days(91);
        let mut fresh = record("BUG-20260101-BBBBBB", "proj_1", "E_B");
        fresh.status = BugStatus::Resolved;
        fresh.updated_at = Utc::now() - ChronoDuration::days(89);
        let mut open = record("BUG-20260101-CCCCCC", "proj_1", "E_C");
        open.updated_at = Utc::now() - ChronoDuration::days(200);
        store.insert(&stale).await?;
        store.insert(&fresh).await?;
        store.insert(&open).await?;

        let cutoff = Utc::now() - ChronoDuration::days(90);
        let aged = store.resolved_before(cutoff).await?;
        assert_eq!(aged.len(), 1);
        assert_eq!(aged[0].bug_id, "BUG-20260101-AAAAAA");
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_set_get_delete() -> Result<(), StorageError> {
        let cache = InMemoryCache::new();
        cache.set_with_ttl("stats:proj_1", "{}", 300).await?;
        assert_eq!(cache.get("stats:proj_1").await?.as_deref(), Some("{}"));

        let ttl = cache.ttl("stats:proj_1").await?;
        assert!(matches!(ttl, Some(t) if t <= 300));

        cache.delete("stats:proj_1").await?;
        assert!(cache.get("stats:proj_1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_zero_ttl_expires_immediately() -> Result<(), StorageError> {
        let cache = InMemoryCache::new();
        cache.set_with_ttl("ephemeral", "v", 0).await?;
        assert!(cache.get("ephemeral").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_pattern_invalidation() -> Result<(), StorageError> {
        let cache = InMemoryCache::new();
        cache.set_with_ttl("search:a:proj_1", "1", 300).await?;
        cache.set_with_ttl("search:b:proj_1", "2", 300).await?;
        cache.set_with_ttl("search:a:proj_2", "3", 300).await?;
        cache.set_with_ttl("stats:proj_1", "4", 300).await?;

        let removed = cache.delete_by_pattern("search:*proj_1*").await?;
        assert_eq!(removed, 2);
        assert!(cache.get("search:a:proj_1").await?.is_none());
        assert!(cache.get("search:a:proj_2").await?.is_some());
        assert!(cache.get("stats:proj_1").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_counter_increment_and_expiry_attach() -> Result<(), StorageError> {
        let cache = InMemoryCache::new();
        assert_eq!(cache.increment("ratelimit:p:k").await?, 1);
        assert_eq!(cache.increment("ratelimit:p:k").await?, 2);
        // New counters carry no expiry until one is attached.
        assert!(cache.ttl("ratelimit:p:k").await?.is_none());

        cache.expire("ratelimit:p:k", 60).await?;
        assert!(matches!(cache.ttl("ratelimit:p:k").await?, Some(t) if t <= 60));
        assert_eq!(cache.increment("ratelimit:p:k").await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_archive_and_list() -> Result<(), StorageError> {
        let archive = InMemoryBugArchive::new();
        let archived = ArchivedBug {
            record: record("BUG-20260101-AAAAAA", "proj_1", "E_A"),
            archived_at: Utc::now(),
        };
        archive.store(&archived).await?;
        assert_eq!(archive.list_by_project("proj_1").await?.len(), 1);
        assert!(archive.list_by_project("proj_2").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_project_directory_lookup() -> Result<(), StorageError> {
        let directory = InMemoryProjectDirectory::new();
        let project = Project {
            project_id: "proj_11111111".to_string(),
            name: "demo".to_string(),
            api_key: "sk_0123456789abcdef".to_string(),
            status: bugvault_core::ProjectStatus::Active,
            rate_limit: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        directory.insert(&project).await?;

        let by_key = directory.find_by_api_key("sk_0123456789abcdef").await?;
        assert_eq!(by_key.map(|p| p.project_id), Some("proj_11111111".into()));
        assert!(directory.find_by_api_key("sk_nope").await?.is_none());
        Ok(())
    }
}
