//! Request and Response Types
//!
//! DTOs for the REST surface plus the standard response envelope and
//! pagination block. Enum-valued request fields (severity, status) arrive
//! as plain strings and are parsed during validation so that bad values
//! produce a 400 in the standard envelope rather than a deserializer
//! rejection.

use axum::http::StatusCode;
use axum::Json;
use bugvault_core::{timefmt, BugContext};
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ============================================================================
// RESPONSE ENVELOPE
// ============================================================================

/// Standard envelope wrapping every successful response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub data: T,
    pub timestamp: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            success: status.is_success(),
            status_code: status.as_u16(),
            message: message.into(),
            data,
            timestamp: timefmt::format(&Utc::now()),
        }
    }
}

/// 200 OK wrapped in the envelope.
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    with_status(StatusCode::OK, message, data)
}

/// 201 Created wrapped in the envelope.
pub fn created<T: Serialize>(
    message: impl Into<String>,
    data: T,
) -> (StatusCode, Json<ApiResponse<T>>) {
    with_status(StatusCode::CREATED, message, data)
}

/// Arbitrary status wrapped in the envelope.
pub fn with_status<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
) -> (StatusCode, Json<ApiResponse<T>>) {
    (status, Json(ApiResponse::new(status, message, data)))
}

// ============================================================================
// PAGINATION
// ============================================================================

/// Pagination block attached to every list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub limit: i64,
    pub offset: i64,
    pub current_page: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// One page of items plus pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, limit: i64, offset: i64) -> Self {
        let limit_u = limit.max(1) as u64;
        let offset_u = offset.max(0) as u64;
        let total_pages = total.div_ceil(limit_u);
        let current_page = offset_u / limit_u + 1;
        Self {
            items,
            pagination: Pagination {
                total,
                limit,
                offset,
                current_page,
                total_pages,
                has_next_page: offset_u + limit_u < total,
                has_prev_page: offset_u > 0,
            },
        }
    }
}

// ============================================================================
// INGESTION REQUESTS
// ============================================================================

/// One error report submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    /// One of "critical", "high", "medium", "low".
    #[serde(default)]
    pub severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<BugContext>,
}

/// A batch of reports, submitted as `{"bugs": [...]}`. Processed
/// item-by-item with per-item isolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReportRequest {
    #[serde(default)]
    pub bugs: Vec<ReportRequest>,
}

/// Acknowledgement returned for a report submission. Clients that want
/// the full record fetch it by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAck {
    pub bug_id: String,
    pub project_id: String,
    pub occurrences: i64,
    pub status: bugvault_core::BugStatus,
    #[serde(with = "timefmt")]
    pub created_at: bugvault_core::Timestamp,
}

impl From<&bugvault_core::BugRecord> for ReportAck {
    fn from(record: &bugvault_core::BugRecord) -> Self {
        Self {
            bug_id: record.bug_id.clone(),
            project_id: record.project_id.clone(),
            occurrences: record.occurrences,
            status: record.status,
            created_at: record.created_at,
        }
    }
}

/// Outcome of one item of a batch submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub success: bool,
    pub bug_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate counters for a batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Full batch response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<BatchItemResult>,
    pub summary: BatchSummary,
}

// ============================================================================
// SOLUTION UPDATES
// ============================================================================

/// Solution update. `status` is required; the solution fields are
/// optional and absent ones keep their previous value (or an empty
/// default when no solution was recorded yet).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionUpdateRequest {
    /// One of "open", "investigating", "resolved", "duplicate".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prevention_tips: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
}

// ============================================================================
// QUERY PARAMETERS
// ============================================================================

/// Query parameters for the project bug listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for search. Facets are comma-separated where multiple
/// values are allowed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Free-text query.
    pub q: Option<String>,
    /// Comma-separated severities.
    pub severity: Option<String>,
    /// Comma-separated statuses.
    pub status: Option<String>,
    pub error_code: Option<String>,
    /// RFC 3339 lower bound on creation time.
    pub from: Option<String>,
    /// RFC 3339 upper bound on creation time.
    pub to: Option<String>,
    pub min_occurrences: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for trend analytics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendParams {
    /// One of "daily", "weekly", "monthly". Defaults to daily.
    pub granularity: Option<String>,
}

/// Query parameters for day-bucketed timeseries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeseriesParams {
    /// Number of trailing days to cover (1-365). Defaults to 30.
    pub days: Option<i64>,
}

/// Query parameters for the cross-project comparison.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComparisonParams {
    /// Comma-separated project IDs.
    pub projects: Option<String>,
}

/// Query parameters for the export endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportParams {
    /// "json" (default) or "csv".
    pub format: Option<String>,
}

// ============================================================================
// ANALYTICS RESPONSES
// ============================================================================

/// Project health report: a 0-100 score with the findings behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub project_id: String,
    pub score: u32,
    /// "healthy", "fair", or "at-risk" derived from the score.
    pub status: String,
    pub recommendations: Vec<String>,
    pub stats: bugvault_storage::StatsSummary,
}

/// One bucket of the trend report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Bucket label: a date, an ISO week, or a month depending on
    /// granularity.
    pub period: String,
    pub new_bugs: i64,
    pub occurrences: i64,
    pub critical: i64,
    pub resolved: i64,
}

/// One entry of the keyword cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub keyword: String,
    pub count: u64,
}

/// One day of the report timeseries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeseriesPoint {
    pub date: String,
    /// New records created that day.
    pub count: i64,
    /// Occurrence total of those records.
    pub occurrences: i64,
    pub resolved: i64,
}

/// One error code of the aggregated ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCodeCount {
    pub error_code: String,
    /// Distinct records carrying the code.
    pub count: i64,
    /// Occurrence total across those records.
    pub occurrences: i64,
}

/// One record of the top-bugs ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopBug {
    pub bug_id: String,
    pub error_code: String,
    pub title: String,
    pub occurrences: i64,
}

/// Aggregated statistics: per-severity/status counts plus rankings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStats {
    pub stats: bugvault_storage::StatsSummary,
    pub avg_occurrences: f64,
    /// Ten most frequent error codes by occurrence total.
    pub top_error_codes: Vec<ErrorCodeCount>,
    /// Ten records with the highest occurrence counts.
    pub top_bugs: Vec<TopBug>,
}

/// One project of a cross-project comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    pub project_id: String,
    pub score: u32,
    pub status: String,
    pub stats: bugvault_storage::StatsSummary,
}

// ============================================================================
// MAINTENANCE RESPONSES
// ============================================================================

/// Outcome of a duplicate-merge maintenance pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    pub groups_merged: usize,
    pub records_removed: usize,
}

/// Outcome of an archive maintenance pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveOutcome {
    pub archived: usize,
}
