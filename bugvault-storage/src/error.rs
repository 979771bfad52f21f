//! Storage error type shared by all backends.

use thiserror::Error;

/// Errors surfaced by storage backends.
///
/// Backend-specific driver errors are flattened to strings at the boundary
/// so the trait objects stay object-safe and callers do not depend on
/// driver types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached at all (connect/handshake failure).
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// The backend accepted the request but failed to execute it.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An in-process lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    /// Whether the error indicates the backend is down rather than a bad
    /// request. Used by health reporting to distinguish degraded from broken.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}
