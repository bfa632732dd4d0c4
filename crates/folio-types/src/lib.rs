//! Foundation types for Folio.
//!
//! This crate provides the document model shared by every other Folio crate:
//!
//! - [`DocumentId`] — string identifier for a document, caller-supplied or
//!   randomly generated (UUID v4)
//! - [`Document`] — one record in a collection: the id, the `_created` and
//!   `_updated` stamps, and the caller's own fields flattened alongside them

pub mod document;

pub use document::{Document, DocumentId};
