use super::types::Verb;
use thiserror::Error;

/// Errors reported by a database handle.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Document '{id}' not found: {reason}")]
    NotFound { id: String, reason: String },

    #[error("Document update conflict on '{0}'")]
    Conflict(String),

    #[error("View '{0}' not found")]
    ViewNotFound(String),

    #[error("Database '{0}' not found")]
    DatabaseNotFound(String),

    #[error("Database '{0}' already exists")]
    DatabaseExists(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid view name '{0}', expected 'design/view'")]
    InvalidViewName(String),

    #[error("Server error {status}: {error} ({reason})")]
    Server {
        status: u16,
        error: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl DbError {
    pub fn not_found(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotFound {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::DatabaseNotFound(_))
    }
}

/// Errors delivered to sync callers.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Model or Collection must have a database!")]
    MissingDatabase,

    #[error("No results")]
    NoResults {
        #[source]
        source: DbError,
    },

    #[error("{0} requires a model with an id")]
    MissingId(Verb),

    #[error("Unknown sync method '{0}'")]
    UnknownVerb(String),

    #[error(transparent)]
    Backend(#[from] DbError),
}

pub type DbResult<T> = std::result::Result<T, DbError>;

pub type SyncResult<T> = std::result::Result<T, SyncError>;
