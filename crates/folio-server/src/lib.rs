//! HTTP server for Folio.
//!
//! Routes `/:ns` and `/:ns/:id` onto the document store: the first path
//! segment names the namespace, the second the record. The handlers are a
//! thin translation layer; all semantics live in the registry and the
//! collection underneath it.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::FolioServer;
