//! Error types for the HTTP layer.
//!
//! Every error renders as `{"error": "<message>"}` with the status the CRUD
//! mapping prescribes: validation problems are 4xx, infrastructure and
//! unexpected domain failures are 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use folio_registry::{CollectionError, RegistryError, StoreError};

#[derive(Debug, Error)]
pub enum ServerError {
    /// The requested record (or its namespace) is absent.
    #[error("record not found")]
    RecordNotFound,

    /// The request body was missing, unparseable, or null.
    #[error("body was not valid")]
    InvalidBody,

    /// A mutation that requires an id arrived without one.
    #[error("invalid request, no id")]
    MissingId,

    /// An update addressed a record that does not exist.
    #[error("no matching record")]
    NoMatchingRecord,

    /// A domain failure the mapping does not translate (e.g. id collision
    /// on create).
    #[error(transparent)]
    Domain(CollectionError),

    /// Registry failure while resolving a namespace.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Store failure outside the domain taxonomy.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// I/O failure in the server itself.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::RecordNotFound => StatusCode::NOT_FOUND,
            Self::InvalidBody | Self::MissingId | Self::NoMatchingRecord => {
                StatusCode::BAD_REQUEST
            }
            Self::Domain(_)
            | Self::Registry(_)
            | Self::Store(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

/// Result alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_crud_mapping() {
        assert_eq!(ServerError::RecordNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ServerError::InvalidBody.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::MissingId.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServerError::NoMatchingRecord.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
