//! Error types for store operations.

use thiserror::Error;

/// Errors from file-backed store operations.
///
/// Domain validation failures come through as [`StoreError::Collection`];
/// everything else is an infrastructure failure. The two are distinct
/// variants so callers can map them to different outcomes (the HTTP layer
/// turns validation into 4xx and I/O into 500).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A domain validation failure from the in-memory collection.
    #[error(transparent)]
    Collection(#[from] folio_collection::CollectionError),

    /// I/O error from the underlying file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure while writing a snapshot.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
