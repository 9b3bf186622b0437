//! Error types for the sync layer.

use crate::sectioned::SaveReport;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The remote store rejected or failed an operation.
    #[error("store error: {0}")]
    Store(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record or document does not have the expected layout.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Some section writes of a full save failed. Successful writes are kept.
    #[error("partial save: {0}")]
    PartialSave(SaveReport),

    /// A listener was cancelled.
    #[error("listener cancelled")]
    Cancelled,
}
