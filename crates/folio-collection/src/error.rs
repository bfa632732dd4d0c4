//! Error types for collection operations.

use folio_types::DocumentId;
use thiserror::Error;

/// Validation failures from collection mutations.
///
/// These are domain errors, returned as ordinary `Err` values so callers
/// compose them without panics. I/O never happens at this layer.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CollectionError {
    /// A required argument was absent (null body or patch).
    #[error("missing required arguments")]
    MissingArguments,

    /// A document with this id already exists in the collection.
    #[error("id already exists: {0}")]
    IdAlreadyExists(DocumentId),

    /// No document with this id exists in the collection.
    #[error("id was not found: {0}")]
    IdNotFound(DocumentId),
}

/// Result alias for collection operations.
pub type CollectionResult<T> = Result<T, CollectionError>;
