pub mod error;
pub mod types;

pub use error::{DbError, DbResult, SyncError, SyncResult};
pub use types::{
    Document, ID_FIELD, QueryOptions, REV_FIELD, RemoveResponse, SaveResponse, Verb, ViewRow,
    document_id, document_rev,
};
