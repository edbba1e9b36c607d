//! Sync
//!
//! The adapter between models/collections and document databases.
//!
//! - `adapter.rs` - verb dispatch and response normalization (SyncAdapter)
//! - `resolve.rs` - database handle and view name resolution
//! - `options.rs` - callback-style options
//! - `response.rs` - normalized results

mod adapter;
mod options;
mod resolve;
mod response;

use crate::core::Document;

pub use adapter::{SyncAdapter, SyncAdapterBuilder, SyncConfig, UpdateStrategy};
pub use options::{ErrorCallback, SuccessCallback, SyncOptions};
pub use resolve::{
    DatabaseProvider, DatabaseRef, ViewName, ViewNameProvider, resolve_database,
    resolve_view_name,
};
pub use response::SyncResponse;

/// Anything the adapter can persist: a single model or a collection.
pub trait Syncable: Send + Sync {
    /// Identifier once persisted. Reads without an id are collection reads.
    fn id(&self) -> Option<&str>;

    /// Plain document snapshot of the current attributes.
    fn to_document(&self) -> Document;

    /// Where this target lives.
    fn database(&self) -> &DatabaseRef;

    /// View queried by collection reads; `None` reads all documents.
    fn view_name(&self) -> Option<&ViewName> {
        None
    }
}
