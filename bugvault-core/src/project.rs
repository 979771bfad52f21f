//! Project (tenant) identity.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a project. Only active projects may submit reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Suspended,
    Disabled,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Suspended => "suspended",
            ProjectStatus::Disabled => "disabled",
        };
        f.write_str(s)
    }
}

/// A tenant of the knowledge base. Created out-of-band (seed/admin path);
/// the API layer only ever reads it, keyed by API key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: String,
    pub name: String,
    /// Opaque lookup credential, `sk_...`. Not a capability token.
    pub api_key: String,
    pub status: ProjectStatus,
    /// Per-project override of the rate-limit window maximum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,
    #[serde(with = "crate::timefmt")]
    pub created_at: Timestamp,
    #[serde(with = "crate::timefmt")]
    pub updated_at: Timestamp,
}

impl Project {
    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }
}
