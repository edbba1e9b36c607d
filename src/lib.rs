// ============================================================================
// docsync Library
// ============================================================================

pub mod core;
pub mod handle;
pub mod connection;
pub mod sync;
pub mod model;
pub mod prelude;

// Re-export main types for convenience
pub use core::{
    DbError, DbResult, Document, QueryOptions, RemoveResponse, SaveResponse, SyncError,
    SyncResult, Verb, ViewRow,
};
pub use handle::{Connector, DatabaseHandle, DbHandle, MemoryDatabase, MemoryServer};
pub use connection::{CouchConnection, CouchDatabase, config::ConnectionConfig};
pub use sync::{
    DatabaseRef, SyncAdapter, SyncAdapterBuilder, SyncConfig, SyncOptions, SyncResponse,
    Syncable, UpdateStrategy, ViewName,
};
pub use model::{Collection, Model};
