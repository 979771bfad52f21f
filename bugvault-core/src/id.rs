//! Public identifier generation and validation.
//!
//! Bug IDs are `BUG-<YYYYMMDD>-<6 uppercase hex>`: human-scannable, sortable
//! by creation date, and random enough to avoid collisions within a day.
//! Project IDs and API keys follow the `proj_`/`sk_` prefix conventions.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

static BUG_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^BUG-\d{8}-[A-Z0-9]{6}$").expect("bug id regex is valid")
});

/// Errors produced when parsing public identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("malformed bug id: {0}")]
    MalformedBugId(String),
}

/// Generate a new bug ID for the given creation instant.
///
/// Format: `BUG-YYYYMMDD-XXXXXX` where the suffix is the first six hex
/// characters of a fresh UUIDv4, uppercased.
pub fn generate_bug_id(now: DateTime<Utc>) -> String {
    let date = now.format("%Y%m%d");
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!("BUG-{date}-{suffix}")
}

/// Generate a new project ID: `proj_` plus eight hex characters.
pub fn generate_project_id() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("proj_{suffix}")
}

/// Generate a new API key: `sk_` plus hex, truncated to 32 characters total.
pub fn generate_api_key() -> String {
    let mut key = format!("sk_{}", Uuid::new_v4().simple());
    key.truncate(32);
    key
}

/// Check whether a string is a well-formed bug ID.
pub fn is_valid_bug_id(bug_id: &str) -> bool {
    BUG_ID_RE.is_match(bug_id)
}

/// Minimal API-key shape check performed before any directory lookup:
/// `sk_` prefix and at least ten characters.
pub fn is_valid_api_key(api_key: &str) -> bool {
    api_key.starts_with("sk_") && api_key.len() >= 10
}

/// Extract the creation date embedded in a bug ID.
pub fn parse_bug_id_date(bug_id: &str) -> Result<NaiveDate, IdError> {
    if !is_valid_bug_id(bug_id) {
        return Err(IdError::MalformedBugId(bug_id.to_string()));
    }
    let date_part = &bug_id[4..12];
    NaiveDate::parse_from_str(date_part, "%Y%m%d")
        .map_err(|_| IdError::MalformedBugId(bug_id.to_string()))
}
