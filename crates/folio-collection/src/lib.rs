//! In-memory record collection for Folio.
//!
//! A [`RecordCollection`] is the document set behind one namespace: a keyed
//! map of [`Document`]s plus the bookkeeping the persisted file carries
//! (`documentCount`, collection timestamps, the reserved `locked` flag).
//! All operations are synchronous and in-memory; persistence is someone
//! else's job, driven by the change notifications this crate emits.
//!
//! # Operations
//!
//! - `create` — insert a new document, stamping `id`/`_created`/`_updated`
//! - `read` — query by [`Selector`]: everything, one id, or a predicate
//! - `update` — right-biased deep-merge of a patch into an existing document
//! - `destroy` — remove a document by id
//! - `clear` — drop every document
//!
//! # Change notifications
//!
//! Every successful mutation emits a [`ChangeEvent`] carrying the mutation
//! kind and a full [`CollectionSnapshot`]. Subscriptions are per-instance:
//! [`RecordCollection::subscribe`] hands out a broadcast receiver filtered
//! by [`ChangeFilter`]; there is no global event bus.
//!
//! # Merge semantics
//!
//! [`merge::deep_merge`] merges JSON objects recursively, right side
//! winning. A right-hand `null` removes the key; non-object right-hand
//! values replace the left wholesale (arrays included, no concatenation).

pub mod collection;
pub mod error;
pub mod events;
pub mod merge;
pub mod snapshot;

pub use collection::{RecordCollection, Selector};
pub use error::{CollectionError, CollectionResult};
pub use events::{ChangeEvent, ChangeFilter, ChangeKind, ChangeStream};
pub use merge::deep_merge;
pub use snapshot::CollectionSnapshot;

// Re-export the document types: every consumer of a collection needs them.
pub use folio_types::{Document, DocumentId};
