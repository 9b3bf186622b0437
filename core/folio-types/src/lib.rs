//! Core type definitions for Folio.
//!
//! This crate defines the small, schema-agnostic types shared by every
//! other crate in the workspace:
//! - Section names (the closed set of top-level content groupings)
//! - Item identifiers (UUID v7) for list entries that need a stable key
//! - ISO-8601 timestamps used in persisted records and exports
//!
//! The content schema itself lives in `folio-model`.

mod ids;
mod section;
mod timestamp;

pub use ids::ItemId;
pub use section::SectionName;
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("unknown section: {0}")]
    UnknownSection(String),
}
