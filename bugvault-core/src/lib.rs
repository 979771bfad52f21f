//! BugVault Core - Entity Types
//!
//! Pure data structures with no behavior beyond identifier handling.
//! All other crates depend on this. This crate contains ONLY data types
//! and ID generation - no I/O and no business logic.

mod bug;
mod id;
mod project;
pub mod timefmt;

pub use bug::{ArchivedBug, BugContext, BugRecord, BugStatus, Severity, Solution};
pub use id::{
    generate_api_key, generate_bug_id, generate_project_id, is_valid_api_key, is_valid_bug_id,
    parse_bug_id_date, IdError,
};
pub use project::{Project, ProjectStatus};

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
