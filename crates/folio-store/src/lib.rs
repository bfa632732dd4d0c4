//! File-backed store instances for Folio.
//!
//! This crate binds one in-memory `RecordCollection` to one JSON file:
//!
//! - [`FileAdapter`] — queued async access to a single file: `load` with
//!   blank/corrupt-content recovery, atomic `save`, `ensure_exists`,
//!   `exists`. Operations are serialized in call order.
//! - [`DataStore`] — loads the file on open, then persists a full snapshot
//!   after every collection mutation via a detached writer task. Writes are
//!   best-effort: a failed background write is logged and dropped, never
//!   surfaced to the mutation's caller.
//! - [`StoreHandle`] — the cloneable async CRUD façade handed to consumers.
//!
//! # Durability
//!
//! Persistence is best-effort: there is no write-ahead log, no fsync
//! guarantee, and no retry. The in-memory collection is the source of truth
//! for the life of the store; the file converges to it on every successful
//! write.

pub mod error;
pub mod file;
pub mod handle;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use file::FileAdapter;
pub use handle::StoreHandle;
pub use store::DataStore;

// Re-export the collection surface consumers need to drive a store.
pub use folio_collection::{
    CollectionError, CollectionSnapshot, Document, DocumentId, Selector,
};
