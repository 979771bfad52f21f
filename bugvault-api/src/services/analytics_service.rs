//! Project analytics: stats, health scoring, trends, keyword clouds, and
//! report timeseries.
//!
//! Every computation here is a pure pass over the project's records;
//! results are cached with generous TTLs since they tolerate staleness.

use std::collections::HashMap;

use bugvault_core::{BugRecord, BugStatus, Severity};
use bugvault_storage::StatsSummary;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{
    AggregatedStats, ComparisonEntry, ErrorCodeCount, HealthReport, KeywordEntry, TimeseriesPoint,
    TopBug, TrendPoint,
};

use super::cache;

// ============================================================================
// STATS
// ============================================================================

/// Per-severity and per-status counts for a project, cached.
pub async fn stats(state: &AppState, project_id: &str) -> ApiResult<StatsSummary> {
    let key = cache::stats_key(project_id);
    if let Some(summary) = cache::get_json::<StatsSummary>(&state.cache, &key).await {
        return Ok(summary);
    }

    let summary = state.bugs.aggregate_stats(project_id).await?;
    cache::put_json(&state.cache, &key, &summary, state.config.stats_ttl_secs).await;
    Ok(summary)
}

// ============================================================================
// HEALTH SCORING
// ============================================================================

/// Compute the 0-100 health score and recommendations from a stats
/// summary. A project with no bugs scores 100.
pub fn score_health(project_id: &str, summary: &StatsSummary) -> HealthReport {
    let mut score: i32 = 100;
    let mut recommendations = Vec::new();

    if summary.total > 0 {
        let total = summary.total as f64;
        let resolution_rate = summary.resolved as f64 / total;
        let critical_rate = summary.critical as f64 / total;
        let investigating_rate = summary.investigating as f64 / total;

        if resolution_rate < 0.5 {
            score -= 20;
            recommendations
                .push("Less than half of known bugs are resolved; schedule a triage pass".into());
        }
        if critical_rate > 0.2 {
            score -= 20;
            recommendations
                .push("High share of critical bugs; prioritize critical fixes".into());
        }
        if investigating_rate > 0.5 {
            score -= 10;
            recommendations.push(
                "Many bugs are stuck in investigation; close out or re-classify stale ones".into(),
            );
        }
        if summary.total > 100 {
            score -= 15;
            recommendations
                .push("Large backlog; consider merging duplicates and archiving resolved bugs"
                    .into());
        }
    }

    let score = score.clamp(0, 100) as u32;
    let status = if score >= 80 {
        "healthy"
    } else if score >= 50 {
        "fair"
    } else {
        "at-risk"
    };

    HealthReport {
        project_id: project_id.to_string(),
        score,
        status: status.to_string(),
        recommendations,
        stats: summary.clone(),
    }
}

/// Health report for a project, cached.
pub async fn health_report(state: &AppState, project_id: &str) -> ApiResult<HealthReport> {
    let key = cache::health_key(project_id);
    if let Some(report) = cache::get_json::<HealthReport>(&state.cache, &key).await {
        return Ok(report);
    }

    let summary = state.bugs.aggregate_stats(project_id).await?;
    let report = score_health(project_id, &summary);
    cache::put_json(&state.cache, &key, &report, state.config.stats_ttl_secs).await;
    Ok(report)
}

// ============================================================================
// TRENDS
// ============================================================================

/// Supported trend bucket sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "daily" => Some(Granularity::Daily),
            "weekly" => Some(Granularity::Weekly),
            "monthly" => Some(Granularity::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }

    /// Bucket label for a record's creation time.
    fn bucket(&self, record: &BugRecord) -> String {
        match self {
            Granularity::Daily => record.created_at.format("%Y-%m-%d").to_string(),
            // ISO week year + week number, e.g. "2026-W35".
            Granularity::Weekly => record.created_at.format("%G-W%V").to_string(),
            Granularity::Monthly => record.created_at.format("%Y-%m").to_string(),
        }
    }
}

/// Group a project's records into creation-time buckets.
pub fn bucket_trends(records: &[BugRecord], granularity: Granularity) -> Vec<TrendPoint> {
    let mut buckets: HashMap<String, TrendPoint> = HashMap::new();
    for record in records {
        let period = granularity.bucket(record);
        let entry = buckets.entry(period.clone()).or_insert(TrendPoint {
            period,
            new_bugs: 0,
            occurrences: 0,
            critical: 0,
            resolved: 0,
        });
        entry.new_bugs += 1;
        entry.occurrences += record.occurrences;
        if record.severity == Severity::Critical {
            entry.critical += 1;
        }
        if record.status == BugStatus::Resolved {
            entry.resolved += 1;
        }
    }
    let mut points: Vec<TrendPoint> = buckets.into_values().collect();
    points.sort_by(|a, b| a.period.cmp(&b.period));
    points
}

/// Creation trend for a project at the requested granularity, cached.
pub async fn trends(
    state: &AppState,
    project_id: &str,
    granularity_raw: Option<&str>,
) -> ApiResult<Vec<TrendPoint>> {
    let granularity = match granularity_raw {
        Some(raw) => Granularity::parse(raw).ok_or_else(|| {
            ApiError::invalid_format("granularity", "one of daily, weekly, monthly")
        })?,
        None => Granularity::Daily,
    };

    let key = cache::trend_key(project_id, granularity.as_str());
    if let Some(points) = cache::get_json::<Vec<TrendPoint>>(&state.cache, &key).await {
        return Ok(points);
    }

    let records = state.bugs.project_records(project_id).await?;
    let points = bucket_trends(&records, granularity);
    cache::put_json(&state.cache, &key, &points, state.config.stats_ttl_secs).await;
    Ok(points)
}

// ============================================================================
// KEYWORD CLOUD
// ============================================================================

const KEYWORD_LIMIT: usize = 20;
const MIN_KEYWORD_LEN: usize = 3;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "with", "that", "this", "from", "was", "are", "has", "had", "not",
        "but", "when", "while", "then", "than", "its", "into", "out", "can", "could", "would",
        "should", "error", "failed", "failure", "exception", "bug", "issue",
    ]
    .into_iter()
    .collect()
});

/// Extract the most frequent meaningful words from titles and messages.
pub fn extract_keywords(records: &[BugRecord]) -> Vec<KeywordEntry> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for record in records {
        for source in [&record.title, &record.message] {
            for token in source
                .to_lowercase()
                .split(|c: char| !c.is_ascii_alphanumeric())
                .filter(|t| t.len() >= MIN_KEYWORD_LEN)
                .filter(|t| !STOPWORDS.contains(t))
            {
                *counts.entry(token.to_string()).or_insert(0) += 1;
            }
        }
    }
    let mut entries: Vec<KeywordEntry> = counts
        .into_iter()
        .map(|(keyword, count)| KeywordEntry { keyword, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.keyword.cmp(&b.keyword)));
    entries.truncate(KEYWORD_LIMIT);
    entries
}

/// Keyword cloud for a project, cached.
pub async fn keywords(state: &AppState, project_id: &str) -> ApiResult<Vec<KeywordEntry>> {
    let key = cache::keywords_key(project_id);
    if let Some(entries) = cache::get_json::<Vec<KeywordEntry>>(&state.cache, &key).await {
        return Ok(entries);
    }

    let records = state.bugs.project_records(project_id).await?;
    let entries = extract_keywords(&records);
    cache::put_json(&state.cache, &key, &entries, state.config.stats_ttl_secs).await;
    Ok(entries)
}

// ============================================================================
// TIMESERIES
// ============================================================================

const DEFAULT_TIMESERIES_DAYS: i64 = 30;
const MAX_TIMESERIES_DAYS: i64 = 365;

/// Day-bucketed count of new records over the trailing window. Days with
/// no reports are present with a zero count.
pub fn bucket_timeseries(records: &[BugRecord], days: i64) -> Vec<TimeseriesPoint> {
    let today = Utc::now().date_naive();
    // (count, occurrences, resolved) per day key.
    let mut counts: HashMap<String, (i64, i64, i64)> = HashMap::new();
    for record in records {
        let day = record.created_at.format("%Y-%m-%d").to_string();
        let entry = counts.entry(day).or_insert((0, 0, 0));
        entry.0 += 1;
        entry.1 += record.occurrences;
        if record.status == BugStatus::Resolved {
            entry.2 += 1;
        }
    }
    (0..days)
        .rev()
        .map(|back| {
            let date = (today - Duration::days(back)).format("%Y-%m-%d").to_string();
            let (count, occurrences, resolved) = counts.get(&date).copied().unwrap_or((0, 0, 0));
            TimeseriesPoint {
                date,
                count,
                occurrences,
                resolved,
            }
        })
        .collect()
}

/// Report timeseries for a project, cached per window length.
pub async fn timeseries(
    state: &AppState,
    project_id: &str,
    days: Option<i64>,
) -> ApiResult<Vec<TimeseriesPoint>> {
    let days = days.unwrap_or(DEFAULT_TIMESERIES_DAYS);
    if !(1..=MAX_TIMESERIES_DAYS).contains(&days) {
        return Err(ApiError::invalid_range("days", 1, MAX_TIMESERIES_DAYS));
    }

    let key = cache::timeseries_key(project_id, days);
    if let Some(points) = cache::get_json::<Vec<TimeseriesPoint>>(&state.cache, &key).await {
        return Ok(points);
    }

    let records = state.bugs.project_records(project_id).await?;
    let points = bucket_timeseries(&records, days);
    cache::put_json(
        &state.cache,
        &key,
        &points,
        state.config.timeseries_ttl_secs,
    )
    .await;
    Ok(points)
}

// ============================================================================
// AGGREGATED STATS
// ============================================================================

const RANKING_LIMIT: usize = 10;

/// Compute rankings and the occurrence average from a project's records.
pub fn aggregate_rankings(summary: StatsSummary, records: &[BugRecord]) -> AggregatedStats {
    let avg_occurrences = if summary.total > 0 {
        summary.total_occurrences as f64 / summary.total as f64
    } else {
        0.0
    };

    let mut by_code: HashMap<&str, (i64, i64)> = HashMap::new();
    for record in records {
        let entry = by_code.entry(record.error_code.as_str()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += record.occurrences;
    }
    let mut top_error_codes: Vec<ErrorCodeCount> = by_code
        .into_iter()
        .map(|(error_code, (count, occurrences))| ErrorCodeCount {
            error_code: error_code.to_string(),
            count,
            occurrences,
        })
        .collect();
    top_error_codes.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then(a.error_code.cmp(&b.error_code))
    });
    top_error_codes.truncate(RANKING_LIMIT);

    let mut top_bugs: Vec<TopBug> = records
        .iter()
        .map(|record| TopBug {
            bug_id: record.bug_id.clone(),
            error_code: record.error_code.clone(),
            title: record.title.clone(),
            occurrences: record.occurrences,
        })
        .collect();
    top_bugs.sort_by(|a, b| b.occurrences.cmp(&a.occurrences).then(a.bug_id.cmp(&b.bug_id)));
    top_bugs.truncate(RANKING_LIMIT);

    AggregatedStats {
        stats: summary,
        avg_occurrences,
        top_error_codes,
        top_bugs,
    }
}

/// Aggregated stats with error-code and top-bug rankings, cached.
pub async fn aggregated_stats(state: &AppState, project_id: &str) -> ApiResult<AggregatedStats> {
    let key = cache::agg_stats_key(project_id);
    if let Some(agg) = cache::get_json::<AggregatedStats>(&state.cache, &key).await {
        return Ok(agg);
    }

    let summary = state.bugs.aggregate_stats(project_id).await?;
    let records = state.bugs.project_records(project_id).await?;
    let agg = aggregate_rankings(summary, &records);
    cache::put_json(&state.cache, &key, &agg, state.config.stats_ttl_secs).await;
    Ok(agg)
}

// ============================================================================
// CROSS-PROJECT COMPARISON
// ============================================================================

const MAX_COMPARISON_PROJECTS: usize = 10;

/// Health-score comparison across an explicit list of projects. Not
/// cached: the admin surface calls it rarely and wants fresh numbers.
pub async fn comparison(
    state: &AppState,
    projects_raw: Option<&str>,
) -> ApiResult<Vec<ComparisonEntry>> {
    let ids: Vec<&str> = projects_raw
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(ApiError::missing_field("projects"));
    }
    if ids.len() > MAX_COMPARISON_PROJECTS {
        return Err(ApiError::invalid_range(
            "projects",
            1,
            MAX_COMPARISON_PROJECTS as i64,
        ));
    }

    let mut entries = Vec::with_capacity(ids.len());
    for project_id in ids {
        let summary = state.bugs.aggregate_stats(project_id).await?;
        let report = score_health(project_id, &summary);
        entries.push(ComparisonEntry {
            project_id: project_id.to_string(),
            score: report.score,
            status: report.status,
            stats: summary,
        });
    }
    entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.project_id.cmp(&b.project_id)));
    Ok(entries)
}

// ============================================================================
// EXPORT
// ============================================================================

/// Hard cap on exported records.
pub const EXPORT_LIMIT: usize = 10_000;

const CSV_HEADER: &str = "bugId,errorCode,title,severity,status,occurrences,createdAt,updatedAt";

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render records as CSV with a fixed column set.
pub fn to_csv(records: &[BugRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            csv_escape(&record.bug_id),
            csv_escape(&record.error_code),
            csv_escape(&record.title),
            record.severity.as_str(),
            record.status.as_str(),
            record.occurrences,
            bugvault_core::timefmt::format(&record.created_at),
            bugvault_core::timefmt::format(&record.updated_at),
        ));
    }
    out
}

/// Fetch a project's records for export, newest first, capped at
/// [`EXPORT_LIMIT`].
pub async fn export_records(state: &AppState, project_id: &str) -> ApiResult<Vec<BugRecord>> {
    let mut records = state.bugs.project_records(project_id).await?;
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records.truncate(EXPORT_LIMIT);
    Ok(records)
}
