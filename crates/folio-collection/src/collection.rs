//! The in-memory record collection.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use folio_types::{Document, DocumentId};
use serde_json::{Map, Value};

use crate::error::{CollectionError, CollectionResult};
use crate::events::{
    ChangeEvent, ChangeFilter, ChangeKind, ChangeRouter, ChangeStream, CHANNEL_CAPACITY,
};
use crate::merge::{deep_merge, merge_all};
use crate::snapshot::CollectionSnapshot;

/// Query selector for [`RecordCollection::read`].
///
/// Dispatch is explicit: every read names which of the three modes it wants
/// instead of overloading one argument.
pub enum Selector {
    /// Every document, in stable id order.
    All,
    /// The document with this id, if present.
    ById(DocumentId),
    /// Every document the predicate accepts, in stable id order.
    Matching(Box<dyn Fn(&Document) -> bool + Send + Sync>),
}

impl Selector {
    /// Select a single document by id.
    pub fn by_id(id: impl Into<DocumentId>) -> Self {
        Self::ById(id.into())
    }

    /// Select documents matching a predicate.
    pub fn matching<F>(predicate: F) -> Self
    where
        F: Fn(&Document) -> bool + Send + Sync + 'static,
    {
        Self::Matching(Box::new(predicate))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::ById(id) => write!(f, "ById({id})"),
            Self::Matching(_) => write!(f, "Matching(..)"),
        }
    }
}

/// An in-memory keyed set of documents with change notifications.
///
/// All operations are synchronous and run to completion without suspension,
/// so two mutations from concurrent callers can never interleave inside one
/// another. Mutations emit a [`ChangeEvent`] carrying a full
/// [`CollectionSnapshot`]; subscribe with [`RecordCollection::subscribe`].
pub struct RecordCollection {
    document_count: u64,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    locked: bool,
    data: BTreeMap<DocumentId, Document>,
    router: ChangeRouter,
}

impl RecordCollection {
    /// Create a new empty collection.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            document_count: 0,
            created: now,
            modified: now,
            locked: false,
            data: BTreeMap::new(),
            router: ChangeRouter::new(),
        }
    }

    /// Hydrate a collection from persisted state.
    ///
    /// `document_count` is recomputed from the document map rather than
    /// trusted, keeping the count invariant intact for hand-edited files.
    pub fn from_snapshot(snapshot: CollectionSnapshot) -> Self {
        Self {
            document_count: snapshot.data.len() as u64,
            created: snapshot.created,
            modified: snapshot.modified,
            locked: snapshot.locked,
            data: snapshot.data,
            router: ChangeRouter::new(),
        }
    }

    /// The persisted subset of this collection's state.
    pub fn snapshot(&self) -> CollectionSnapshot {
        CollectionSnapshot {
            document_count: self.document_count,
            created: self.created,
            modified: self.modified,
            locked: self.locked,
            data: self.data.clone(),
        }
    }

    /// Subscribe to change events matching `filter`.
    pub fn subscribe(&self, filter: ChangeFilter) -> ChangeStream {
        self.router.subscribe(filter, CHANNEL_CAPACITY)
    }

    /// Number of documents currently present.
    pub fn document_count(&self) -> u64 {
        self.document_count
    }

    /// When the collection was created.
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// When the collection last changed.
    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    /// The reserved `locked` flag from persisted state.
    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Insert a new document.
    ///
    /// The body's fields are deep-merged under the stamped `id`, `_created`
    /// and `_updated` fields, so the stamps always win over caller-supplied
    /// values of the same names. On a fresh document `_created == _updated`.
    ///
    /// Fails with [`CollectionError::MissingArguments`] for a null body and
    /// [`CollectionError::IdAlreadyExists`] when `id` is taken; a failed
    /// create leaves the collection untouched.
    pub fn create(&mut self, body: Value, id: Option<DocumentId>) -> CollectionResult<Document> {
        if body.is_null() {
            return Err(CollectionError::MissingArguments);
        }
        if let Some(id) = id.as_ref().filter(|id| !id.is_empty()) {
            if self.data.contains_key(id) {
                return Err(CollectionError::IdAlreadyExists(id.clone()));
            }
        }
        let id = id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(DocumentId::generate);
        let now = Utc::now();

        // Merging into an empty object strips nulls and reduces a
        // non-object body to no fields at all.
        let mut fields = match merge_all([body]) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        fields.remove("id");
        fields.remove("_created");
        fields.remove("_updated");

        let doc = Document::new(id.clone(), now, now, fields);
        self.data.insert(id, doc.clone());
        self.document_count += 1;
        self.modified = now;
        self.emit(ChangeKind::Created);
        Ok(doc)
    }

    /// Query documents. Never fails, never mutates.
    pub fn read(&self, selector: &Selector) -> Vec<Document> {
        match selector {
            Selector::All => self.data.values().cloned().collect(),
            Selector::ById(id) => self.data.get(id).cloned().into_iter().collect(),
            Selector::Matching(predicate) => self
                .data
                .values()
                .filter(|doc| predicate(doc))
                .cloned()
                .collect(),
        }
    }

    /// Deep-merge `patch` into the document with the given id.
    ///
    /// The merge order is: existing document, then the patch, then a fresh
    /// `_updated` stamp, so an explicit `_updated` in the patch never
    /// survives. A null patch value removes the field.
    ///
    /// Fails with [`CollectionError::IdNotFound`] when the id is empty or
    /// absent, and [`CollectionError::MissingArguments`] for a non-object
    /// patch.
    pub fn update(&mut self, patch: Value, id: &DocumentId) -> CollectionResult<Document> {
        if !patch.is_object() {
            return Err(CollectionError::MissingArguments);
        }
        if id.is_empty() {
            return Err(CollectionError::IdNotFound(id.clone()));
        }
        let existing = match self.data.get(id) {
            Some(doc) => doc,
            None => return Err(CollectionError::IdNotFound(id.clone())),
        };

        let now = Utc::now();
        let merged = deep_merge(existing.to_value(), patch);
        let doc = document_from_merged(merged, existing, now);
        self.data.insert(id.clone(), doc.clone());
        self.modified = now;
        self.emit(ChangeKind::Updated);
        Ok(doc)
    }

    /// Remove the document with the given id and return it.
    ///
    /// Fails with [`CollectionError::IdNotFound`] when the id is empty or
    /// absent.
    pub fn destroy(&mut self, id: &DocumentId) -> CollectionResult<Document> {
        if id.is_empty() {
            return Err(CollectionError::IdNotFound(id.clone()));
        }
        let doc = match self.data.remove(id) {
            Some(doc) => doc,
            None => return Err(CollectionError::IdNotFound(id.clone())),
        };
        self.document_count -= 1;
        self.modified = Utc::now();
        self.emit(ChangeKind::Destroyed);
        Ok(doc)
    }

    /// Remove every document. Returns the (always empty) read-back.
    pub fn clear(&mut self) -> Vec<Document> {
        self.data.clear();
        self.document_count = 0;
        self.modified = Utc::now();
        self.emit(ChangeKind::Cleared);
        Vec::new()
    }

    fn emit(&self, kind: ChangeKind) {
        let event = ChangeEvent {
            kind,
            snapshot: self.snapshot(),
        };
        self.router.route(&event);
    }
}

impl Default for RecordCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecordCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordCollection")
            .field("document_count", &self.document_count)
            .field("modified", &self.modified)
            .finish()
    }
}

/// Rebuild a typed document from a merged JSON object.
///
/// The patch may rewrite `id` and `_created` (the merge is right-biased all
/// the way down); if it deletes or mangles them into something that cannot
/// hydrate, the existing document's values are kept, since a typed store
/// cannot represent a document without an id. `_updated` always takes the
/// fresh stamp.
fn document_from_merged(merged: Value, existing: &Document, updated: DateTime<Utc>) -> Document {
    let mut map = match merged {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let id = map
        .remove("id")
        .and_then(|v| v.as_str().map(DocumentId::from))
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| existing.id.clone());
    let created = map
        .remove("_created")
        .and_then(|v| {
            v.as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(existing.created);
    map.remove("_updated");
    Document::new(id, created, updated, map)
}
