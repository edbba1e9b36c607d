//! Database and view-name resolution
//!
//! Models and collections describe where they live with small tagged
//! unions; these are turned into a concrete handle and view name right
//! before dispatch.

use super::Syncable;
use crate::handle::{Connector, DbHandle};
use std::fmt;
use std::sync::Arc;

/// Produces a handle for a target, or `None` when it has nowhere to go.
pub type DatabaseProvider = Arc<dyn Fn(&dyn Syncable) -> Option<DbHandle> + Send + Sync>;

/// Produces a view name on demand.
pub type ViewNameProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// Where a model or collection is persisted.
#[derive(Clone, Default)]
pub enum DatabaseRef {
    /// Use the adapter's default database.
    #[default]
    Default,
    /// Ask a function, called with the target being synced.
    Provider(DatabaseProvider),
    /// Open the named database through the adapter's connector.
    Name(String),
    /// Use an already opened handle.
    Prepared(DbHandle),
}

impl DatabaseRef {
    pub fn name(name: impl Into<String>) -> Self {
        DatabaseRef::Name(name.into())
    }

    pub fn provider<F>(provider: F) -> Self
    where
        F: Fn(&dyn Syncable) -> Option<DbHandle> + Send + Sync + 'static,
    {
        DatabaseRef::Provider(Arc::new(provider))
    }

    pub fn prepared(handle: DbHandle) -> Self {
        DatabaseRef::Prepared(handle)
    }
}

impl fmt::Debug for DatabaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseRef::Default => f.write_str("Default"),
            DatabaseRef::Provider(_) => f.write_str("Provider(..)"),
            DatabaseRef::Name(name) => f.debug_tuple("Name").field(name).finish(),
            DatabaseRef::Prepared(handle) => f.debug_tuple("Prepared").field(&handle.name()).finish(),
        }
    }
}

impl From<&str> for DatabaseRef {
    fn from(name: &str) -> Self {
        DatabaseRef::Name(name.to_string())
    }
}

impl From<String> for DatabaseRef {
    fn from(name: String) -> Self {
        DatabaseRef::Name(name)
    }
}

impl From<DbHandle> for DatabaseRef {
    fn from(handle: DbHandle) -> Self {
        DatabaseRef::Prepared(handle)
    }
}

/// Name of the view a collection reads from.
#[derive(Clone)]
pub enum ViewName {
    Name(String),
    Provider(ViewNameProvider),
}

impl ViewName {
    pub fn provider<F>(provider: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        ViewName::Provider(Arc::new(provider))
    }
}

impl fmt::Debug for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewName::Name(name) => f.debug_tuple("Name").field(name).finish(),
            ViewName::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

impl From<&str> for ViewName {
    fn from(name: &str) -> Self {
        ViewName::Name(name.to_string())
    }
}

impl From<String> for ViewName {
    fn from(name: String) -> Self {
        ViewName::Name(name)
    }
}

/// Pick the handle a target should be synced against.
///
/// Never fails on its own: `None` means nothing resolved and the caller
/// reports the missing database.
pub fn resolve_database(
    reference: &DatabaseRef,
    target: &dyn Syncable,
    default: Option<&DbHandle>,
    connector: &dyn Connector,
) -> Option<DbHandle> {
    match reference {
        DatabaseRef::Default => default.cloned(),
        DatabaseRef::Provider(provider) => provider(target),
        DatabaseRef::Name(name) => Some(connector.database(name)),
        DatabaseRef::Prepared(handle) => Some(Arc::clone(handle)),
    }
}

/// Resolve a view name. Empty names mean "no named view".
pub fn resolve_view_name(view_name: Option<&ViewName>) -> Option<String> {
    let name = match view_name? {
        ViewName::Name(name) => name.clone(),
        ViewName::Provider(provider) => provider(),
    };
    (!name.is_empty()).then_some(name)
}
