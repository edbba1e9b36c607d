pub mod config;
mod database;

use crate::core::{DbError, DbResult};
use crate::handle::{Connector, DbHandle};
use std::sync::Arc;

pub use config::ConnectionConfig;
pub use database::CouchDatabase;

pub(crate) struct ClientInner {
    pub(crate) config: ConnectionConfig,
    pub(crate) http: reqwest::Client,
}

/// Connection to a CouchDB server
///
/// Holds one HTTP client shared by every database opened from it.
#[derive(Clone)]
pub struct CouchConnection {
    inner: Arc<ClientInner>,
}

impl CouchConnection {
    /// Connect with the given configuration
    ///
    /// No request is made until a database operation runs.
    ///
    /// # Examples
    ///
    /// ```
    /// # use docsync::{ConnectionConfig, CouchConnection};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let connection = CouchConnection::new(ConnectionConfig::new().port(5984))?;
    /// let todos = connection.open("todos");
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: ConnectionConfig) -> DbResult<Self> {
        config.validate().map_err(DbError::Config)?;

        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            inner: Arc::new(ClientInner { config, http }),
        })
    }

    /// Connect using a connection string
    ///
    /// Format: `http[s]://[username:password@]host[:port][/database]`
    pub fn from_url(url: &str) -> DbResult<Self> {
        let config = ConnectionConfig::from_url(url).map_err(DbError::Config)?;
        Self::new(config)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Open a database on this server
    pub fn open(&self, name: &str) -> CouchDatabase {
        CouchDatabase::new(name, Arc::clone(&self.inner))
    }

    /// Open the database named in the connection URL, if one was given
    pub fn default_database(&self) -> Option<CouchDatabase> {
        self.inner.config.database.as_deref().map(|name| self.open(name))
    }
}

impl Connector for CouchConnection {
    fn database(&self, name: &str) -> DbHandle {
        Arc::new(self.open(name))
    }
}
