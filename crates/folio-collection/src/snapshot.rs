//! The persisted subset of collection state.
//!
//! A [`CollectionSnapshot`] is exactly what gets written to (and read from)
//! a namespace's JSON file: the document count, the collection timestamps,
//! the reserved `locked` flag, and the id → document map. Transient state
//! (subscribers, routing) never appears here.
//!
//! Serialized keys are pinned to the wire format: `documentCount`,
//! `created`, `modified`, `locked`, `data`. Every field has a default, so a
//! partial file (including `{}`) hydrates into a valid empty snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use folio_types::{Document, DocumentId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSnapshot {
    /// Number of documents in `data`.
    #[serde(default)]
    pub document_count: u64,
    /// When the collection was created.
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    /// When the collection last changed.
    #[serde(default = "Utc::now")]
    pub modified: DateTime<Utc>,
    /// Reserved flag carried in persisted state; not enforced by the core.
    #[serde(default)]
    pub locked: bool,
    /// The documents, keyed by id. A `BTreeMap` keeps the file stable
    /// across rewrites.
    #[serde(default)]
    pub data: BTreeMap<DocumentId, Document>,
}

impl CollectionSnapshot {
    /// A snapshot of a brand-new empty collection.
    pub fn empty() -> Self {
        let now = Utc::now();
        Self {
            document_count: 0,
            created: now,
            modified: now,
            locked: false,
            data: BTreeMap::new(),
        }
    }

    /// Returns `true` when the snapshot holds no documents.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for CollectionSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
