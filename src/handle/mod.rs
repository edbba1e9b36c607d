//! Database handles
//!
//! A handle is the capability the sync adapter drives: one connection to one
//! document database. The adapter never implements persistence itself, it
//! only decides which handle to call.
//!
//! - `DatabaseHandle` - the six document operations
//! - `Connector` - builds handles from database names
//! - `memory` - in-process implementation with CouchDB-like revisions

mod collate;
pub mod memory;

use crate::core::{DbResult, Document, QueryOptions, RemoveResponse, SaveResponse, ViewRow};
use async_trait::async_trait;
use std::sync::Arc;

pub use collate::collate;
pub use memory::{MapFn, MemoryDatabase, MemoryServer};

/// Operations a document database exposes to the adapter.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    /// Name of the database this handle talks to.
    fn name(&self) -> &str;

    /// Fetch a document by id.
    async fn get(&self, id: &str) -> DbResult<Document>;

    /// Query a named view (`"design/view"`).
    async fn view(&self, view_name: &str, query: &QueryOptions) -> DbResult<Vec<ViewRow>>;

    /// Query every document in the database.
    async fn all(&self, query: &QueryOptions) -> DbResult<Vec<ViewRow>>;

    /// Save a new document. An `_id` inside the document is honoured,
    /// otherwise the backend assigns one.
    async fn save(&self, doc: Document) -> DbResult<SaveResponse>;

    /// Save a document under an explicit id, replacing the stored body.
    async fn save_with_id(&self, id: &str, doc: Document) -> DbResult<SaveResponse>;

    /// Remove a document, returning the tombstone revision.
    async fn remove(&self, id: &str) -> DbResult<RemoveResponse>;
}

/// Shared handle as held by models, collections and the adapter.
pub type DbHandle = Arc<dyn DatabaseHandle>;

/// Builds database handles from names using a fixed set of connection settings.
pub trait Connector: Send + Sync {
    fn database(&self, name: &str) -> DbHandle;
}
