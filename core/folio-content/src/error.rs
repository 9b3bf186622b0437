//! Error types for the content store.

use crate::path::PathError;
use folio_model::ShapeViolation;
use thiserror::Error;

/// Result type for content operations.
pub type ContentResult<T> = Result<T, ContentError>;

/// Errors that can occur while reading or mutating content.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The mutation path is malformed or walks through a non-object.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A mutation would leave a declared field with the wrong shape.
    #[error("invalid shape: {0}")]
    Shape(ShapeViolation),

    /// An import payload was rejected.
    #[error("invalid import: {0}")]
    Import(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ShapeViolation> for ContentError {
    fn from(v: ShapeViolation) -> Self {
        ContentError::Shape(v)
    }
}
