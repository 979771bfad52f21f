//! Bug record entities.
//!
//! A `BugRecord` is one logical defect for a project, identified by its
//! dedup signature `(project_id, error_code)`. Recurrences of the same
//! signature do not create new records; they bump `occurrences` and refresh
//! the descriptive payload.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ENUMS
// ============================================================================

/// Severity of a defect class. Assigned at first sighting and never changed
/// by later recurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// All valid severity values, in descending order of urgency.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Parse a lowercase severity string.
    pub fn parse(s: &str) -> Option<Severity> {
        match s {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a bug record.
///
/// Any value in the set is accepted at any time; there is no enforced
/// transition table. `Duplicate` is terminal by convention only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BugStatus {
    Open,
    Investigating,
    Resolved,
    Duplicate,
}

impl BugStatus {
    pub const ALL: [BugStatus; 4] = [
        BugStatus::Open,
        BugStatus::Investigating,
        BugStatus::Resolved,
        BugStatus::Duplicate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BugStatus::Open => "open",
            BugStatus::Investigating => "investigating",
            BugStatus::Resolved => "resolved",
            BugStatus::Duplicate => "duplicate",
        }
    }

    pub fn parse(s: &str) -> Option<BugStatus> {
        match s {
            "open" => Some(BugStatus::Open),
            "investigating" => Some(BugStatus::Investigating),
            "resolved" => Some(BugStatus::Resolved),
            "duplicate" => Some(BugStatus::Duplicate),
            _ => None,
        }
    }
}

impl fmt::Display for BugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ENTITIES
// ============================================================================

/// Free-form context payload attached to a report. Opaque, string-keyed,
/// replaced wholesale on every recurrence.
pub type BugContext = serde_json::Map<String, serde_json::Value>;

/// Recorded solution for a bug. Partial updates merge field-by-field with
/// the previous value rather than replacing the whole object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub fix: String,
    pub prevention_tips: Vec<String>,
    pub root_cause: String,
    #[serde(with = "crate::timefmt")]
    pub updated_at: Timestamp,
}

/// One logical defect, deduplicated by `(project_id, error_code)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugRecord {
    /// Public identifier, `BUG-<YYYYMMDD>-<6 chars>`. Immutable.
    pub bug_id: String,
    /// Owning project. Part of the dedup signature.
    pub project_id: String,
    /// Caller-supplied defect class code. Part of the dedup signature.
    pub error_code: String,
    pub title: String,
    /// Latest reported message. Overwritten on every recurrence.
    pub message: String,
    /// Set at first sighting; recurrences never change it.
    pub severity: Severity,
    /// Overwritten on recurrence only when the new report carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    /// Latest reported context. Replaced wholesale on every recurrence.
    #[serde(default)]
    pub context: BugContext,
    /// Number of times this signature has been reported. Starts at 1.
    pub occurrences: i64,
    pub status: BugStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<Solution>,
    /// Set once at creation. Immutable.
    #[serde(with = "crate::timefmt")]
    pub created_at: Timestamp,
    /// Refreshed on every mutation.
    #[serde(with = "crate::timefmt")]
    pub updated_at: Timestamp,
}

impl BugRecord {
    /// The dedup signature identifying this logical defect.
    pub fn signature(&self) -> (&str, &str) {
        (&self.project_id, &self.error_code)
    }
}

/// A bug record moved to cold storage after aging out of the primary store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedBug {
    #[serde(flatten)]
    pub record: BugRecord,
    #[serde(with = "crate::timefmt")]
    pub archived_at: Timestamp,
}
