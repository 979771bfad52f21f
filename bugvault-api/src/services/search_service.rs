//! Free-text and faceted search over a project's bug records.
//!
//! Result pages are cached briefly; any mutation to the project
//! invalidates them (see `services::cache`).

use bugvault_core::{BugRecord, BugStatus, Severity, Timestamp};
use bugvault_storage::SearchQuery;
use chrono::{DateTime, Utc};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{Paginated, SearchParams};
use crate::validation::{self, ValidateMaxLen, ValidateNonEmpty, MAX_QUERY_LEN};

use super::cache;

/// Parse a comma-separated severity facet.
fn parse_severities(raw: &str) -> ApiResult<Vec<Severity>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Severity::parse(s).ok_or_else(|| {
                ApiError::invalid_format("severity", "one of critical, high, medium, low")
            })
        })
        .collect()
}

/// Parse a comma-separated status facet.
fn parse_statuses(raw: &str) -> ApiResult<Vec<BugStatus>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            BugStatus::parse(s).ok_or_else(|| {
                ApiError::invalid_format(
                    "status",
                    "one of open, investigating, resolved, duplicate",
                )
            })
        })
        .collect()
}

fn parse_timestamp(field: &str, raw: &str) -> ApiResult<Timestamp> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ApiError::invalid_format(field, "an RFC 3339 timestamp"))
}

/// Validate search parameters and build the storage query.
pub fn build_query(params: &SearchParams) -> ApiResult<SearchQuery> {
    let q = params.q.as_deref().unwrap_or("");
    q.validate_non_empty("q")?;
    q.validate_max_len("q", MAX_QUERY_LEN)?;

    let severities = match &params.severity {
        Some(raw) => parse_severities(raw)?,
        None => Vec::new(),
    };
    let statuses = match &params.status {
        Some(raw) => parse_statuses(raw)?,
        None => Vec::new(),
    };
    let created_from = match &params.from {
        Some(raw) => Some(parse_timestamp("from", raw)?),
        None => None,
    };
    let created_to = match &params.to {
        Some(raw) => Some(parse_timestamp("to", raw)?),
        None => None,
    };
    if let Some(min) = params.min_occurrences {
        if min < 1 {
            return Err(ApiError::invalid_range("minOccurrences", 1, i64::MAX));
        }
    }
    let (limit, offset) = validation::validate_page(params.limit, params.offset)?;

    Ok(SearchQuery {
        text: Some(q.trim().to_string()),
        severities,
        statuses,
        // An empty facet value means "no constraint", same as absence.
        error_code: params
            .error_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        created_from,
        created_to,
        min_occurrences: params.min_occurrences,
        limit,
        offset,
    })
}

/// Run a search, serving from cache when a fresh page exists. The cache
/// key is derived from the normalized query, never the raw parameters.
pub async fn search(
    state: &AppState,
    project_id: &str,
    params: &SearchParams,
) -> ApiResult<Paginated<BugRecord>> {
    let query = build_query(params)?;
    let key = cache::search_key(project_id, &query);

    if let Some(page) = cache::get_json::<Paginated<BugRecord>>(&state.cache, &key).await {
        return Ok(page);
    }

    let page = state.bugs.search(project_id, &query).await?;
    let result = Paginated::new(page.bugs, page.total, query.limit, query.offset);
    cache::put_json(&state.cache, &key, &result, state.config.search_ttl_secs).await;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_requires_text() {
        let params = SearchParams::default();
        assert!(build_query(&params).is_err());

        let params = SearchParams {
            q: Some("   ".to_string()),
            ..SearchParams::default()
        };
        assert!(build_query(&params).is_err());
    }

    #[test]
    fn test_build_query_parses_facets() -> ApiResult<()> {
        let params = SearchParams {
            q: Some("timeout".to_string()),
            severity: Some("critical, high".to_string()),
            status: Some("open".to_string()),
            from: Some("2026-01-01T00:00:00Z".to_string()),
            min_occurrences: Some(3),
            ..SearchParams::default()
        };
        let query = build_query(&params)?;
        assert_eq!(query.text.as_deref(), Some("timeout"));
        assert_eq!(query.severities, vec![Severity::Critical, Severity::High]);
        assert_eq!(query.statuses, vec![BugStatus::Open]);
        assert!(query.created_from.is_some());
        assert_eq!(query.min_occurrences, Some(3));
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset, 0);
        Ok(())
    }

    #[test]
    fn test_build_query_normalizes_empty_error_code() -> ApiResult<()> {
        let params = SearchParams {
            q: Some("timeout".to_string()),
            error_code: Some("  ".to_string()),
            ..SearchParams::default()
        };
        assert_eq!(build_query(&params)?.error_code, None);

        let params = SearchParams {
            q: Some("timeout".to_string()),
            error_code: Some("DB_TIMEOUT".to_string()),
            ..SearchParams::default()
        };
        assert_eq!(
            build_query(&params)?.error_code.as_deref(),
            Some("DB_TIMEOUT")
        );
        Ok(())
    }

    #[test]
    fn test_build_query_rejects_bad_values() {
        let params = SearchParams {
            q: Some("timeout".to_string()),
            severity: Some("urgent".to_string()),
            ..SearchParams::default()
        };
        assert!(build_query(&params).is_err());

        let params = SearchParams {
            q: Some("timeout".to_string()),
            from: Some("yesterday".to_string()),
            ..SearchParams::default()
        };
        assert!(build_query(&params).is_err());

        let params = SearchParams {
            q: Some("timeout".to_string()),
            min_occurrences: Some(0),
            ..SearchParams::default()
        };
        assert!(build_query(&params).is_err());

        let params = SearchParams {
            q: Some("x".repeat(MAX_QUERY_LEN + 1)),
            ..SearchParams::default()
        };
        assert!(build_query(&params).is_err());
    }
}
