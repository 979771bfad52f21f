//! Storage trait definitions.
//!
//! Every backend implements these traits; the API layer holds
//! `Arc<dyn BugStore>` (etc.) and never names a concrete backend.

use async_trait::async_trait;
use bugvault_core::{
    ArchivedBug, BugContext, BugRecord, BugStatus, Project, Severity, Solution, Timestamp,
};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

// ============================================================================
// SUPPORTING TYPES
// ============================================================================

/// Fields refreshed when an existing signature is reported again.
///
/// Recurrence never touches severity, title, status, solution, or
/// `created_at`; it bumps `occurrences` and replaces the descriptive
/// payload with the latest report.
#[derive(Debug, Clone)]
pub struct RecurrenceUpdate {
    pub message: String,
    pub context: BugContext,
    /// Replaces the stored trace only when the new report carries one.
    pub stack_trace: Option<String>,
}

/// One page of bug records plus the total match count before pagination.
#[derive(Debug, Clone)]
pub struct BugPage {
    pub bugs: Vec<BugRecord>,
    pub total: u64,
}

/// Filters for the search operation. All filters are conjunctive; empty
/// vectors and `None` fields mean "no constraint".
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Free-text query matched against title, message, and error code.
    pub text: Option<String>,
    pub severities: Vec<Severity>,
    pub statuses: Vec<BugStatus>,
    /// Exact error-code match (codes are uppercase by validation).
    pub error_code: Option<String>,
    pub created_from: Option<Timestamp>,
    pub created_to: Option<Timestamp>,
    pub min_occurrences: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

/// Per-severity and per-status counts for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total: i64,
    pub critical: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
    pub open: i64,
    pub investigating: i64,
    pub resolved: i64,
    pub duplicate: i64,
    pub total_occurrences: i64,
}

impl StatsSummary {
    /// Fold one record into the summary. Backends without server-side
    /// aggregation build summaries with this.
    pub fn absorb(&mut self, record: &BugRecord) {
        self.total += 1;
        self.total_occurrences += record.occurrences;
        match record.severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
        match record.status {
            BugStatus::Open => self.open += 1,
            BugStatus::Investigating => self.investigating += 1,
            BugStatus::Resolved => self.resolved += 1,
            BugStatus::Duplicate => self.duplicate += 1,
        }
    }
}

// ============================================================================
// TRAITS
// ============================================================================

/// Primary store of live bug records.
#[async_trait]
pub trait BugStore: Send + Sync {
    /// Look up the record for a dedup signature, if any. When concurrent
    /// writers have raced a signature into multiple records, returns the
    /// earliest-created one.
    async fn find_by_signature(
        &self,
        project_id: &str,
        error_code: &str,
    ) -> Result<Option<BugRecord>, StorageError>;

    /// Insert a new record. The caller has already generated the bug ID.
    async fn insert(&self, record: &BugRecord) -> Result<(), StorageError>;

    /// Atomically bump `occurrences` and refresh the descriptive payload.
    /// Returns the updated record, or `None` if the ID no longer exists.
    async fn record_recurrence(
        &self,
        bug_id: &str,
        update: &RecurrenceUpdate,
        now: Timestamp,
    ) -> Result<Option<BugRecord>, StorageError>;

    /// Set the status and solution of a record. The caller merges the new
    /// solution with the previous one before calling. Returns the updated
    /// record, or `None` if the ID no longer exists.
    async fn apply_solution(
        &self,
        bug_id: &str,
        status: BugStatus,
        solution: &Solution,
        now: Timestamp,
    ) -> Result<Option<BugRecord>, StorageError>;

    async fn find_by_id(&self, bug_id: &str) -> Result<Option<BugRecord>, StorageError>;

    /// Page through a project's records, newest first.
    async fn list_by_project(
        &self,
        project_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<BugPage, StorageError>;

    /// Filtered search within a project, newest first.
    async fn search(
        &self,
        project_id: &str,
        query: &SearchQuery,
    ) -> Result<BugPage, StorageError>;

    /// Per-severity and per-status counts for a project.
    async fn aggregate_stats(&self, project_id: &str) -> Result<StatsSummary, StorageError>;

    /// Every record for a project, unpaginated. Analytics passes consume
    /// whole projects; project sizes are bounded by archival.
    async fn project_records(&self, project_id: &str) -> Result<Vec<BugRecord>, StorageError>;

    /// Groups of records sharing a dedup signature, across all projects.
    /// Only groups with more than one member are returned; members are
    /// sorted by `created_at` ascending.
    async fn duplicate_groups(&self) -> Result<Vec<Vec<BugRecord>>, StorageError>;

    /// Add `delta` to a record's occurrence count and refresh `updated_at`.
    async fn adjust_occurrences(
        &self,
        bug_id: &str,
        delta: i64,
        now: Timestamp,
    ) -> Result<(), StorageError>;

    /// Resolved records whose last update predates `cutoff`.
    async fn resolved_before(&self, cutoff: Timestamp) -> Result<Vec<BugRecord>, StorageError>;

    /// Delete a record by ID. Returns whether a record was removed.
    async fn delete(&self, bug_id: &str) -> Result<bool, StorageError>;
}

/// Cold storage for records aged out of the primary store.
#[async_trait]
pub trait BugArchive: Send + Sync {
    async fn store(&self, bug: &ArchivedBug) -> Result<(), StorageError>;

    async fn list_by_project(&self, project_id: &str) -> Result<Vec<ArchivedBug>, StorageError>;
}

/// Read-mostly directory of projects, keyed by API key for auth lookups.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Project>, StorageError>;

    async fn find_by_id(&self, project_id: &str) -> Result<Option<Project>, StorageError>;

    async fn insert(&self, project: &Project) -> Result<(), StorageError>;
}

/// String-keyed cache with TTLs, glob invalidation, and counters.
///
/// The counter operations (`increment`, `expire`, `ttl`) exist for the
/// fixed-window rate limiter, which shares the cache backend.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Delete every key matching a glob pattern (`*` wildcards only).
    /// Returns the number of keys removed.
    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, StorageError>;

    /// Increment an integer counter, creating it at 1 if absent.
    /// Returns the post-increment value.
    async fn increment(&self, key: &str) -> Result<i64, StorageError>;

    /// Set a key's TTL without touching its value.
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StorageError>;

    /// Remaining TTL in seconds, or `None` if the key is absent or has
    /// no expiry.
    async fn ttl(&self, key: &str) -> Result<Option<u64>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(severity: Severity, status: BugStatus, occurrences: i64) -> BugRecord {
        BugRecord {
            bug_id: "BUG-20260101-ABC123".to_string(),
            project_id: "proj_11111111".to_string(),
            error_code: "E".to_string(),
            title: "t".to_string(),
            message: "m".to_string(),
            severity,
            stack_trace: None,
            context: BugContext::new(),
            occurrences,
            status,
            solution: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stats_summary_absorb() {
        let mut summary = StatsSummary::default();
        summary.absorb(&record(Severity::Critical, BugStatus::Open, 3));
        summary.absorb(&record(Severity::Critical, BugStatus::Resolved, 1));
        summary.absorb(&record(Severity::Low, BugStatus::Investigating, 2));

        assert_eq!(summary.total, 3);
        assert_eq!(summary.critical, 2);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.investigating, 1);
        assert_eq!(summary.total_occurrences, 6);
    }

    #[test]
    fn test_stats_summary_wire_format() -> Result<(), serde_json::Error> {
        let summary = StatsSummary::default();
        let json = serde_json::to_value(&summary)?;
        assert!(json.get("totalOccurrences").is_some());
        assert!(json.get("investigating").is_some());
        Ok(())
    }
}
