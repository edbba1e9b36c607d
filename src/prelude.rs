//! Recommended API entrypoints grouped by abstraction level.
//!
//! `models` is the default for application code persisting models and
//! collections. `handles` is the lower-level surface for driving databases
//! directly or writing a new backend.

pub mod models {
    //! Models, collections and the adapter they persist through.
    pub use crate::{
        Collection, DatabaseRef, Model, SyncAdapter, SyncError, SyncOptions, SyncResponse,
        SyncResult, ViewName,
    };
}

pub mod handles {
    //! Database handles and the types they exchange.
    pub use crate::{
        Connector, DatabaseHandle, DbError, DbHandle, DbResult, Document, QueryOptions,
        RemoveResponse, SaveResponse, Syncable, Verb, ViewRow,
    };
}
