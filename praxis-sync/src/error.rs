//! Error types for the sync layer.
//!
//! Public orchestrator and adapter operations communicate failure through
//! sentinels (booleans, `None`) rather than errors; `SyncError` exists for
//! the internal transport helpers and for drain handlers, which may fail
//! with a transport error and have the entry retained.

use praxis_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network error (unreachable host, non-success status).
    #[error("network error: {0}")]
    Network(String),

    /// Serialization error (malformed response body or payload).
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local persistence error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
