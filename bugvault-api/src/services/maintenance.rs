//! Maintenance passes: duplicate merging and resolved-bug archival.
//!
//! Both are manual, admin-triggered operations. They tolerate partial
//! progress: each group or record is handled independently, so a failure
//! mid-pass leaves earlier work in place.

use std::collections::HashSet;

use bugvault_core::ArchivedBug;
use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::{ArchiveOutcome, MergeOutcome};

use super::cache;

/// Merge records that share a dedup signature (created by racing first
/// reports). The earliest-created record of each group becomes the
/// primary: it absorbs the group's total occurrence count and the rest
/// are deleted.
pub async fn merge_duplicates(state: &AppState) -> ApiResult<MergeOutcome> {
    let groups = state.bugs.duplicate_groups().await?;
    let now = Utc::now();

    let mut groups_merged = 0usize;
    let mut records_removed = 0usize;
    let mut touched_projects: HashSet<String> = HashSet::new();

    for group in groups {
        let primary = &group[0];
        let total_occurrences: i64 = group.iter().map(|r| r.occurrences).sum();
        let delta = total_occurrences - primary.occurrences;

        if delta > 0 {
            state
                .bugs
                .adjust_occurrences(&primary.bug_id, delta, now)
                .await?;
        }
        for duplicate in &group[1..] {
            if !state.bugs.delete(&duplicate.bug_id).await? {
                warn!(bug_id = %duplicate.bug_id, "duplicate vanished before deletion");
                continue;
            }
            records_removed += 1;
        }

        info!(
            bug_id = %primary.bug_id,
            error_code = %primary.error_code,
            absorbed = group.len() - 1,
            total_occurrences,
            "merged duplicate group"
        );
        touched_projects.insert(primary.project_id.clone());
        groups_merged += 1;
    }

    for project_id in &touched_projects {
        cache::invalidate_project(&state.cache, project_id).await;
    }

    Ok(MergeOutcome {
        groups_merged,
        records_removed,
    })
}

/// Move resolved bugs whose last update is older than the configured age
/// into the archive. Copy-before-delete: a record is only removed from
/// the primary store once its archive copy is written.
pub async fn archive_resolved(state: &AppState) -> ApiResult<ArchiveOutcome> {
    let cutoff = Utc::now() - Duration::days(state.config.archive_after_days);
    let aged = state.bugs.resolved_before(cutoff).await?;
    let now = Utc::now();

    let mut archived = 0usize;
    let mut touched_projects: HashSet<String> = HashSet::new();

    for record in aged {
        let project_id = record.project_id.clone();
        let bug_id = record.bug_id.clone();
        state
            .archive
            .store(&ArchivedBug {
                record,
                archived_at: now,
            })
            .await?;
        if state.bugs.delete(&bug_id).await? {
            archived += 1;
            touched_projects.insert(project_id);
        }
    }

    if archived > 0 {
        info!(archived, cutoff = %cutoff, "archived resolved bugs");
    }
    for project_id in &touched_projects {
        cache::invalidate_project(&state.cache, project_id).await;
    }

    Ok(ArchiveOutcome { archived })
}
