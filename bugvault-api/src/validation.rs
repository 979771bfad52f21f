//! Validation Traits and Report Field Rules
//!
//! Common validation patterns extracted from route handlers, plus the
//! field-level rules for report ingestion and solution updates.

use bugvault_core::{BugStatus, Severity};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ApiError, ApiResult};
use crate::types::{ListParams, ReportRequest, SolutionUpdateRequest};

// ============================================================================
// FIELD LIMITS
// ============================================================================

pub const MAX_ERROR_CODE_LEN: usize = 100;
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_MESSAGE_LEN: usize = 1000;
pub const MAX_STACK_TRACE_LEN: usize = 5000;
pub const MAX_QUERY_LEN: usize = 200;
pub const MAX_FIX_LEN: usize = 2000;
pub const MAX_PREVENTION_TIP_LEN: usize = 500;
pub const MAX_ROOT_CAUSE_LEN: usize = 1000;

pub const MIN_PAGE_LIMIT: i64 = 1;
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Error codes are uppercase alphanumerics and underscores only, so they
/// behave as stable dedup keys rather than free text.
static ERROR_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9_]+$").expect("error code regex is valid"));

// ============================================================================
// VALIDATION TRAITS
// ============================================================================

/// Trait for validating non-empty strings.
pub trait ValidateNonEmpty {
    /// Validate that the value is non-empty.
    ///
    /// # Errors
    /// Returns `ApiError::missing_field` if the value is empty or
    /// whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

/// Trait for validating string length caps.
pub trait ValidateMaxLen {
    /// Validate that the value does not exceed `max` characters.
    fn validate_max_len(&self, field_name: &str, max: usize) -> ApiResult<()>;
}

impl ValidateMaxLen for str {
    fn validate_max_len(&self, field_name: &str, max: usize) -> ApiResult<()> {
        if self.chars().count() > max {
            return Err(ApiError::validation_failed(format!(
                "Field '{}' exceeds maximum length of {} characters",
                field_name, max
            )));
        }
        Ok(())
    }
}

impl ValidateMaxLen for String {
    fn validate_max_len(&self, field_name: &str, max: usize) -> ApiResult<()> {
        self.as_str().validate_max_len(field_name, max)
    }
}

// ============================================================================
// REPORT VALIDATION
// ============================================================================

/// Validate an incoming report and parse its severity.
pub fn validate_report(req: &ReportRequest) -> ApiResult<Severity> {
    req.error_code.validate_non_empty("errorCode")?;
    req.error_code
        .validate_max_len("errorCode", MAX_ERROR_CODE_LEN)?;
    if !ERROR_CODE_RE.is_match(&req.error_code) {
        return Err(ApiError::invalid_format(
            "errorCode",
            "uppercase letters, digits, and underscores",
        ));
    }

    req.title.validate_non_empty("title")?;
    req.title.validate_max_len("title", MAX_TITLE_LEN)?;

    req.message.validate_non_empty("message")?;
    req.message.validate_max_len("message", MAX_MESSAGE_LEN)?;

    if let Some(trace) = &req.stack_trace {
        trace.validate_max_len("stackTrace", MAX_STACK_TRACE_LEN)?;
    }

    req.severity.validate_non_empty("severity")?;
    Severity::parse(&req.severity).ok_or_else(|| {
        ApiError::invalid_format("severity", "one of critical, high, medium, low")
    })
}

/// Validate a solution update and parse its status. The status is
/// mandatory on every update; the solution fields are optional and merge
/// with previous values.
pub fn validate_solution_update(req: &SolutionUpdateRequest) -> ApiResult<BugStatus> {
    let raw = req
        .status
        .as_deref()
        .ok_or_else(|| ApiError::missing_field("status"))?;
    let status = BugStatus::parse(raw).ok_or_else(|| {
        ApiError::invalid_format("status", "one of open, investigating, resolved, duplicate")
    })?;

    if let Some(fix) = &req.fix {
        fix.validate_max_len("fix", MAX_FIX_LEN)?;
    }
    if let Some(tips) = &req.prevention_tips {
        for tip in tips {
            tip.validate_max_len("preventionTips", MAX_PREVENTION_TIP_LEN)?;
        }
    }
    if let Some(root_cause) = &req.root_cause {
        root_cause.validate_max_len("rootCause", MAX_ROOT_CAUSE_LEN)?;
    }

    Ok(status)
}

// ============================================================================
// PAGINATION VALIDATION
// ============================================================================

/// Validate and default pagination parameters.
pub fn validate_page(limit: Option<i64>, offset: Option<i64>) -> ApiResult<(i64, i64)> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if !(MIN_PAGE_LIMIT..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(ApiError::invalid_range(
            "limit",
            MIN_PAGE_LIMIT,
            MAX_PAGE_LIMIT,
        ));
    }
    let offset = offset.unwrap_or(0);
    if offset < 0 {
        return Err(ApiError::invalid_range("offset", 0, i64::MAX));
    }
    Ok((limit, offset))
}

/// Validate pagination carried in list query parameters.
pub fn validate_list_params(params: &ListParams) -> ApiResult<(i64, i64)> {
    validate_page(params.limit, params.offset)
}
