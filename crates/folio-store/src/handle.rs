//! The CRUD façade handed to store consumers.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use folio_collection::{Document, DocumentId, Selector};

use crate::error::StoreResult;
use crate::store::DataStore;

/// Cheap, cloneable CRUD surface over a [`DataStore`].
///
/// A handle is a forwarding reference, not an owner: every clone operates on
/// the same underlying collection, and a handle that outlives its store's
/// registry entry keeps working against the orphaned in-memory collection
/// (without persistence; the evicted store is detached from its file).
///
/// Each operation is async and resolves once the in-memory mutation has been
/// applied; the persistence side-effect is never awaited.
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<DataStore>,
}

impl StoreHandle {
    /// Wrap a store in a façade.
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Insert a new document with an optional caller-supplied id.
    pub async fn create(&self, body: Value, id: Option<DocumentId>) -> StoreResult<Document> {
        Ok(self.store.create(body, id)?)
    }

    /// Query documents by selector.
    pub async fn read(&self, selector: &Selector) -> Vec<Document> {
        self.store.read(selector)
    }

    /// Deep-merge a patch into the document with the given id.
    pub async fn update(&self, patch: Value, id: &DocumentId) -> StoreResult<Document> {
        Ok(self.store.update(patch, id)?)
    }

    /// Remove the document with the given id.
    pub async fn destroy(&self, id: &DocumentId) -> StoreResult<Document> {
        Ok(self.store.destroy(id)?)
    }

    /// Remove every document.
    pub async fn clear(&self) -> Vec<Document> {
        self.store.clear()
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("path", &self.store.path())
            .finish()
    }
}
