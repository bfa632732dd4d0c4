//! Error types for namespace registry operations.

use thiserror::Error;

/// Errors that can occur while building or evicting namespaces.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No namespace names were given.
    #[error("incorrect number of arguments")]
    MissingArguments,

    /// The namespace's backing file does not exist.
    #[error("namespace does not exist: {0}")]
    NamespaceDoesNotExist(String),

    /// A store-level failure (I/O or domain) while building a namespace.
    #[error(transparent)]
    Store(#[from] folio_store::StoreError),

    /// A concurrent build task died before producing a result.
    #[error("background build failed: {0}")]
    TaskFailed(String),
}

/// Convenience type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
