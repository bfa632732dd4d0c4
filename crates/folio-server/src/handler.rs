//! Request handlers: the CRUD mapping over namespaces.
//!
//! Status mapping, per verb:
//!
//! - `GET /:ns` — 200 with the full collection as an array, 404 when the
//!   namespace file is absent
//! - `GET /:ns/:id` — 200 with a one-element array, 404 when absent
//! - `POST /:ns[/:id]` — 201 with the created document; 400 on an invalid
//!   body, 500 on a domain failure such as an id collision
//! - `PUT /:ns/:id` — 200 with the updated document; 400 on an invalid body
//!   or when no record matches
//! - `DELETE /:ns/:id` — 204; 400 without an id, 404 when absent

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};

use folio_registry::{
    CollectionError, Document, DocumentId, Registry, RegistryError, Selector, StoreError,
    StoreHandle,
};

use crate::error::{ServerError, ServerResult};

/// Health check handler.
pub async fn health() -> Json<Value> {
    Json(json!({
        "name": "folio-server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
    }))
}

/// `GET /:ns` — the whole collection.
pub async fn read_namespace(
    State(registry): State<Registry>,
    Path(ns): Path<String>,
) -> ServerResult<Json<Vec<Document>>> {
    let store = lookup(&registry, &ns).await?;
    Ok(Json(store.read(&Selector::All).await))
}

/// `GET /:ns/:id` — one record, as a one-element array.
pub async fn read_document(
    State(registry): State<Registry>,
    Path((ns, id)): Path<(String, String)>,
) -> ServerResult<Json<Vec<Document>>> {
    let store = lookup(&registry, &ns).await?;
    let docs = store.read(&Selector::by_id(id.as_str())).await;
    if docs.is_empty() {
        return Err(ServerError::RecordNotFound);
    }
    Ok(Json(docs))
}

/// `POST /:ns` — create with a generated id.
pub async fn create_document(
    State(registry): State<Registry>,
    Path(ns): Path<String>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<Document>)> {
    create_inner(registry, ns, None, body).await
}

/// `POST /:ns/:id` — create with a caller-supplied id.
pub async fn create_document_with_id(
    State(registry): State<Registry>,
    Path((ns, id)): Path<(String, String)>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<Document>)> {
    create_inner(registry, ns, Some(DocumentId::new(id)), body).await
}

async fn create_inner(
    registry: Registry,
    ns: String,
    id: Option<DocumentId>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<Document>)> {
    let body = parse_body(&body)?;
    // Writes may create the namespace on first use.
    let store = registry.create_file_and_get(&ns).await?;
    let doc = store.create(body, id).await.map_err(domain_is_internal)?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// `PUT /:ns/:id` — deep-merge update of an existing record.
pub async fn update_document(
    State(registry): State<Registry>,
    Path((ns, id)): Path<(String, String)>,
    body: Bytes,
) -> ServerResult<Json<Document>> {
    let patch = parse_body(&body)?;
    let store = registry.get_if_file_exists(&ns).await.map_err(|e| match e {
        // An update can only address records that already exist.
        RegistryError::NamespaceDoesNotExist(_) => ServerError::NoMatchingRecord,
        other => ServerError::Registry(other),
    })?;
    let doc = store
        .update(patch, &DocumentId::new(id))
        .await
        .map_err(|e| match e {
            StoreError::Collection(CollectionError::IdNotFound(_)) => {
                ServerError::NoMatchingRecord
            }
            StoreError::Collection(CollectionError::MissingArguments) => ServerError::InvalidBody,
            other => ServerError::Store(other),
        })?;
    Ok(Json(doc))
}

/// `DELETE /:ns/:id` — remove a record.
pub async fn destroy_document(
    State(registry): State<Registry>,
    Path((ns, id)): Path<(String, String)>,
) -> ServerResult<StatusCode> {
    let store = registry.get_if_file_exists(&ns).await.map_err(|e| match e {
        RegistryError::NamespaceDoesNotExist(_) => ServerError::RecordNotFound,
        other => ServerError::Registry(other),
    })?;
    match store.destroy(&DocumentId::new(id)).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::Collection(CollectionError::IdNotFound(_))) => {
            Err(ServerError::RecordNotFound)
        }
        Err(other) => Err(ServerError::Store(other)),
    }
}

/// `DELETE /:ns` — rejected: a delete needs an id.
pub async fn destroy_missing_id() -> ServerError {
    ServerError::MissingId
}

async fn lookup(registry: &Registry, ns: &str) -> ServerResult<StoreHandle> {
    registry.get_if_file_exists(ns).await.map_err(|e| match e {
        RegistryError::NamespaceDoesNotExist(_) => ServerError::RecordNotFound,
        other => ServerError::Registry(other),
    })
}

fn parse_body(bytes: &Bytes) -> ServerResult<Value> {
    let value: Value = serde_json::from_slice(bytes).map_err(|_| ServerError::InvalidBody)?;
    if value.is_null() {
        return Err(ServerError::InvalidBody);
    }
    Ok(value)
}

/// Domain failures on create surface as internal errors per the mapping.
fn domain_is_internal(error: StoreError) -> ServerError {
    match error {
        StoreError::Collection(e) => ServerError::Domain(e),
        other => ServerError::Store(other),
    }
}
