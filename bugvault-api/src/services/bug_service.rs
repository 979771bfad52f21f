//! Report ingestion and bug record operations.
//!
//! The dedup engine lives here: a report either creates a new record or
//! bumps the occurrence count of the record sharing its
//! `(project, errorCode)` signature.

use bugvault_core::{generate_bug_id, BugRecord, BugStatus, Solution};
use bugvault_storage::RecurrenceUpdate;
use chrono::Utc;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{
    BatchItemResult, BatchOutcome, BatchReportRequest, BatchSummary, Paginated, ReportRequest,
    SolutionUpdateRequest,
};
use crate::validation;

use super::cache;

/// What a report submission did.
#[derive(Debug, Clone)]
pub enum ReportOutcome {
    /// First sighting of the signature; a new record was created.
    Created(BugRecord),
    /// The signature already existed; its occurrence count was bumped.
    Recurred(BugRecord),
}

impl ReportOutcome {
    pub fn record(&self) -> &BugRecord {
        match self {
            ReportOutcome::Created(record) | ReportOutcome::Recurred(record) => record,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, ReportOutcome::Created(_))
    }
}

/// Submit one report: validate, dedup by signature, then insert or record
/// a recurrence. Two concurrent first reports of one signature may both
/// insert; the merge maintenance pass reconciles such pairs.
pub async fn submit_report(
    state: &AppState,
    project_id: &str,
    req: &ReportRequest,
) -> ApiResult<ReportOutcome> {
    let severity = validation::validate_report(req)?;
    let now = Utc::now();
    let context = req.context.clone().unwrap_or_default();

    let outcome = match state
        .bugs
        .find_by_signature(project_id, &req.error_code)
        .await?
    {
        Some(existing) => {
            let update = RecurrenceUpdate {
                message: req.message.clone(),
                context,
                stack_trace: req.stack_trace.clone(),
            };
            let updated = state
                .bugs
                .record_recurrence(&existing.bug_id, &update, now)
                .await?
                .ok_or_else(|| ApiError::bug_not_found(&existing.bug_id))?;
            debug!(
                bug_id = %updated.bug_id,
                occurrences = updated.occurrences,
                "recorded recurrence"
            );
            ReportOutcome::Recurred(updated)
        }
        None => {
            let record = BugRecord {
                bug_id: generate_bug_id(now),
                project_id: project_id.to_string(),
                error_code: req.error_code.clone(),
                title: req.title.clone(),
                message: req.message.clone(),
                severity,
                stack_trace: req.stack_trace.clone(),
                context,
                occurrences: 1,
                status: BugStatus::Open,
                solution: None,
                created_at: now,
                updated_at: now,
            };
            state.bugs.insert(&record).await?;
            info!(bug_id = %record.bug_id, error_code = %record.error_code, "created bug record");
            ReportOutcome::Created(record)
        }
    };

    cache::invalidate_project(&state.cache, project_id).await;
    Ok(outcome)
}

/// Submit a batch of reports with per-item isolation. Batches over the
/// configured cap are rejected wholesale; within a batch, one bad item
/// never blocks the rest.
pub async fn submit_batch(
    state: &AppState,
    project_id: &str,
    batch: &BatchReportRequest,
) -> ApiResult<BatchOutcome> {
    if batch.bugs.is_empty() {
        return Err(ApiError::missing_field("bugs"));
    }
    if batch.bugs.len() > state.config.batch_max_reports {
        return Err(ApiError::validation_failed(format!(
            "Batch exceeds maximum of {} bugs",
            state.config.batch_max_reports
        )));
    }

    let mut results = Vec::with_capacity(batch.bugs.len());
    let mut successful = 0usize;
    for report in &batch.bugs {
        match submit_report(state, project_id, report).await {
            Ok(outcome) => {
                successful += 1;
                let message = if outcome.is_created() {
                    "Bug report created"
                } else {
                    "Occurrence recorded"
                };
                results.push(BatchItemResult {
                    success: true,
                    bug_id: Some(outcome.record().bug_id.clone()),
                    message: message.to_string(),
                    error: None,
                });
            }
            Err(err) => {
                results.push(BatchItemResult {
                    success: false,
                    bug_id: None,
                    message: err.message.clone(),
                    error: Some(err.code.to_string()),
                });
            }
        }
    }

    let total = results.len();
    Ok(BatchOutcome {
        results,
        summary: BatchSummary {
            total,
            successful,
            failed: total - successful,
        },
    })
}

/// Fetch one bug. A record belonging to a different project reads as
/// not-found rather than forbidden, so bug ids do not leak across tenants.
pub async fn get_bug(state: &AppState, project_id: &str, bug_id: &str) -> ApiResult<BugRecord> {
    let record = state
        .bugs
        .find_by_id(bug_id)
        .await?
        .filter(|r| r.project_id == project_id)
        .ok_or_else(|| ApiError::bug_not_found(bug_id))?;
    Ok(record)
}

/// Page through a project's records, newest first.
pub async fn list_bugs(
    state: &AppState,
    project_id: &str,
    limit: i64,
    offset: i64,
) -> ApiResult<Paginated<BugRecord>> {
    let page = state.bugs.list_by_project(project_id, limit, offset).await?;
    Ok(Paginated::new(page.bugs, page.total, limit, offset))
}

/// Update a bug's solution and status. Solution fields merge with the
/// previous value; an absent field keeps what was recorded before.
pub async fn update_solution(
    state: &AppState,
    project_id: &str,
    bug_id: &str,
    req: &SolutionUpdateRequest,
) -> ApiResult<BugRecord> {
    let status = validation::validate_solution_update(req)?;
    let existing = get_bug(state, project_id, bug_id).await?;
    let now = Utc::now();

    let previous = existing.solution.clone();
    let merged = Solution {
        fix: req
            .fix
            .clone()
            .or_else(|| previous.as_ref().map(|s| s.fix.clone()))
            .unwrap_or_default(),
        prevention_tips: req
            .prevention_tips
            .clone()
            .or_else(|| previous.as_ref().map(|s| s.prevention_tips.clone()))
            .unwrap_or_default(),
        root_cause: req
            .root_cause
            .clone()
            .or_else(|| previous.as_ref().map(|s| s.root_cause.clone()))
            .unwrap_or_default(),
        updated_at: now,
    };

    let updated = state
        .bugs
        .apply_solution(bug_id, status, &merged, now)
        .await?
        .ok_or_else(|| ApiError::bug_not_found(bug_id))?;
    info!(bug_id, status = %status, "updated solution");

    cache::invalidate_project(&state.cache, project_id).await;
    Ok(updated)
}
