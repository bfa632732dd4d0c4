//! Namespace registry for Folio.
//!
//! A namespace is a named, file-backed document collection. This crate maps
//! namespace names to their files (`<base_dir>/<namespace>.json`) and
//! guarantees single-instance-per-file semantics: however many times a
//! namespace is built, one file has at most one live in-memory store, and
//! every façade handed out for it shares that store.
//!
//! # Lifecycle
//!
//! - [`Registry::build`] — lazily create the file and the cached store
//! - [`Registry::prepare_namespaces`] — build several namespaces at once
//! - [`Registry::get_if_file_exists`] / [`Registry::create_file_and_get`] —
//!   build variants that check or force the file's existence first
//! - [`Registry::clear_namespace`] — evict the cached store (the file
//!   stays); the next build re-loads from disk
//!
//! The cache is per-registry, not process-global: construct one registry
//! per data directory, or one per test.

pub mod error;
pub mod registry;

pub use error::{RegistryError, Result};
pub use registry::{Registry, DEFAULT_BASE_DIR};

// Re-export the store surface a registry consumer works with.
pub use folio_store::{
    CollectionError, Document, DocumentId, Selector, StoreError, StoreHandle,
};
