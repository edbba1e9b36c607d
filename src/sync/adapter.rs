//! Sync Adapter
//!
//! Translates the four persistence verbs into database handle calls and
//! normalizes the replies. Each call resolves exactly one handle, issues its
//! request and produces exactly one outcome.

use super::resolve::{resolve_database, resolve_view_name};
use super::{SyncOptions, SyncResponse, Syncable};
use crate::connection::{ConnectionConfig, CouchConnection};
use crate::core::{DbResult, Document, QueryOptions, SyncError, SyncResult, Verb, ViewRow};
use crate::handle::{Connector, DbHandle};
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// How `update` builds the document it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateStrategy {
    /// Write the model's full attribute set, replacing the stored body.
    #[default]
    Overwrite,
    /// Fetch the stored document and write it with the model's attributes
    /// laid over it, keeping fields the model does not carry.
    Merge,
}

/// Configuration for SyncAdapter
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    pub update_strategy: UpdateStrategy,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.update_strategy = strategy;
        self
    }
}

/// Builder for SyncAdapter
#[derive(Default)]
pub struct SyncAdapterBuilder {
    default_database: Option<DbHandle>,
    connector: Option<Arc<dyn Connector>>,
    config: SyncConfig,
}

impl SyncAdapterBuilder {
    /// Handle used by targets whose database is `DatabaseRef::Default`.
    pub fn default_database(mut self, handle: DbHandle) -> Self {
        self.default_database = Some(handle);
        self
    }

    /// Connector used to open databases given by name.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn update_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.config.update_strategy = strategy;
        self
    }

    /// Build the adapter. Without an explicit connector, names are opened on
    /// a CouchDB server with default connection settings.
    pub fn build(self) -> DbResult<SyncAdapter> {
        let connector: Arc<dyn Connector> = match self.connector {
            Some(connector) => connector,
            None => Arc::new(CouchConnection::new(ConnectionConfig::default())?),
        };

        Ok(SyncAdapter {
            default_database: self.default_database,
            connector,
            config: self.config,
        })
    }
}

/// Sync Adapter - maps read/create/update/delete onto a document database
#[derive(Clone)]
pub struct SyncAdapter {
    default_database: Option<DbHandle>,
    connector: Arc<dyn Connector>,
    config: SyncConfig,
}

impl SyncAdapter {
    pub fn builder() -> SyncAdapterBuilder {
        SyncAdapterBuilder::default()
    }

    /// Adapter with a default database and a connector for named databases.
    pub fn new(default_database: DbHandle, connector: Arc<dyn Connector>) -> Self {
        Self {
            default_database: Some(default_database),
            connector,
            config: SyncConfig::default(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn default_database(&self) -> Option<&DbHandle> {
        self.default_database.as_ref()
    }

    /// The handle a target would be synced against.
    pub fn resolve_database(&self, target: &dyn Syncable) -> Option<DbHandle> {
        resolve_database(
            target.database(),
            target,
            self.default_database.as_ref(),
            self.connector.as_ref(),
        )
    }

    /// Perform one sync and return its outcome.
    ///
    /// `data` is only used by collection reads.
    pub async fn sync(
        &self,
        verb: Verb,
        target: &dyn Syncable,
        data: Option<QueryOptions>,
    ) -> SyncResult<SyncResponse> {
        let db = match self.resolve_database(target) {
            Some(db) => db,
            None => {
                debug!("sync {}: no database resolved", verb);
                return Err(SyncError::MissingDatabase);
            }
        };
        debug!("sync {} against '{}'", verb, db.name());

        match verb {
            Verb::Read => match target.id() {
                Some(id) => read_one(&db, id).await,
                None => read_many(&db, target, data).await,
            },
            Verb::Create => {
                let res = db.save(target.to_document()).await?;
                Ok(SyncResponse::Created {
                    id: res.id,
                    rev: res.rev,
                })
            }
            Verb::Update => {
                let id = target.id().ok_or(SyncError::MissingId(Verb::Update))?;
                let doc = match self.config.update_strategy {
                    UpdateStrategy::Overwrite => target.to_document(),
                    UpdateStrategy::Merge => merged_document(&db, id, target).await?,
                };
                let res = db.save_with_id(id, doc).await?;
                Ok(SyncResponse::Updated { rev: res.rev })
            }
            Verb::Delete => {
                let id = target.id().ok_or(SyncError::MissingId(Verb::Delete))?;
                let res = db.remove(id).await?;
                Ok(SyncResponse::Deleted { rev: res.rev })
            }
        }
    }

    /// Callback-style sync: runs `sync` and hands the outcome to exactly one
    /// of the option callbacks.
    pub async fn sync_with(&self, verb: Verb, target: &dyn Syncable, mut options: SyncOptions) {
        let data = options.data.take();
        let result = self.sync(verb, target, data).await;
        options.deliver(result);
    }

    /// Callback-style sync with the verb given by name. Unknown names are
    /// reported to the error callback.
    pub async fn sync_named(&self, method: &str, target: &dyn Syncable, options: SyncOptions) {
        match method.parse::<Verb>() {
            Ok(verb) => self.sync_with(verb, target, options).await,
            Err(err) => {
                warn!("sync rejected unknown method '{}'", method);
                options.deliver(Err(err));
            }
        }
    }

    /// Run a callback-style sync on the tokio runtime and return at once.
    ///
    /// The task yields the target back when it completes.
    pub fn spawn_sync<T>(&self, verb: Verb, target: T, options: SyncOptions) -> JoinHandle<T>
    where
        T: Syncable + 'static,
    {
        let adapter = self.clone();
        tokio::spawn(async move {
            adapter.sync_with(verb, &target, options).await;
            target
        })
    }
}

async fn read_one(db: &DbHandle, id: &str) -> SyncResult<SyncResponse> {
    db.get(id)
        .await
        .map(SyncResponse::Document)
        .map_err(|source| SyncError::NoResults { source })
}

async fn read_many(
    db: &DbHandle,
    target: &dyn Syncable,
    data: Option<QueryOptions>,
) -> SyncResult<SyncResponse> {
    let mut query = data.unwrap_or_default();
    query.insert("include_docs".to_string(), Value::Bool(true));

    let rows = match resolve_view_name(target.view_name()) {
        Some(view_name) => db.view(&view_name, &query).await?,
        None => db.all(&query).await?,
    };

    let docs = rows.into_iter().filter_map(ViewRow::into_document).collect();
    Ok(SyncResponse::Documents(docs))
}

async fn merged_document(db: &DbHandle, id: &str, target: &dyn Syncable) -> SyncResult<Document> {
    let mut stored = match db.get(id).await {
        Ok(stored) => stored,
        Err(err) if err.is_not_found() => Document::new(),
        Err(err) => return Err(err.into()),
    };
    stored.extend(target.to_document());
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DbResult, RemoveResponse, SaveResponse};
    use crate::handle::{DatabaseHandle, MemoryDatabase, MemoryServer};
    use crate::sync::{DatabaseRef, ViewName};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    struct Target {
        id: Option<String>,
        attributes: Document,
        database: DatabaseRef,
        view_name: Option<ViewName>,
    }

    impl Target {
        fn model(attributes: Value) -> Self {
            let attributes = doc(attributes);
            Self {
                id: attributes.get("_id").and_then(Value::as_str).map(String::from),
                attributes,
                database: DatabaseRef::Default,
                view_name: None,
            }
        }
    }

    impl Syncable for Target {
        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn to_document(&self) -> Document {
            self.attributes.clone()
        }

        fn database(&self) -> &DatabaseRef {
            &self.database
        }

        fn view_name(&self) -> Option<&ViewName> {
            self.view_name.as_ref()
        }
    }

    /// Records every call before forwarding it to an in-memory database.
    struct RecordingHandle {
        inner: MemoryDatabase,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingHandle {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryDatabase::new("recorded"),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn record(&self, method: &str, arg: Value) {
            self.calls.lock().unwrap().push((method.to_string(), arg));
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DatabaseHandle for RecordingHandle {
        fn name(&self) -> &str {
            self.inner.name()
        }

        async fn get(&self, id: &str) -> DbResult<Document> {
            self.record("get", json!(id));
            self.inner.get(id).await
        }

        async fn view(&self, view_name: &str, query: &QueryOptions) -> DbResult<Vec<ViewRow>> {
            self.record("view", json!({"name": view_name, "query": query}));
            Ok(Vec::new())
        }

        async fn all(&self, query: &QueryOptions) -> DbResult<Vec<ViewRow>> {
            self.record("all", Value::Object(query.clone()));
            self.inner.all(query).await
        }

        async fn save(&self, doc: Document) -> DbResult<SaveResponse> {
            self.record("save", Value::Object(doc.clone()));
            self.inner.save(doc).await
        }

        async fn save_with_id(&self, id: &str, doc: Document) -> DbResult<SaveResponse> {
            self.record("save_with_id", json!({"id": id, "doc": doc}));
            self.inner.save_with_id(id, doc).await
        }

        async fn remove(&self, id: &str) -> DbResult<RemoveResponse> {
            self.record("remove", json!(id));
            self.inner.remove(id).await
        }
    }

    fn adapter_with(handle: DbHandle) -> SyncAdapter {
        SyncAdapter::new(handle, Arc::new(MemoryServer::new()))
    }

    #[tokio::test]
    async fn test_missing_database_makes_no_call() {
        let adapter = SyncAdapter::builder()
            .connector(Arc::new(MemoryServer::new()))
            .build()
            .unwrap();

        for verb in [Verb::Read, Verb::Create, Verb::Update, Verb::Delete] {
            let target = Target::model(json!({"_id": "t1"}));
            let err = adapter.sync(verb, &target, None).await.unwrap_err();
            assert!(matches!(err, SyncError::MissingDatabase));
            assert_eq!(err.to_string(), "Model or Collection must have a database!");
        }
    }

    #[tokio::test]
    async fn test_read_missing_is_generic_error() {
        let handle = RecordingHandle::new();
        let adapter = adapter_with(handle.clone());

        let target = Target::model(json!({"_id": "nope"}));
        let err = adapter.sync(Verb::Read, &target, None).await.unwrap_err();

        assert_eq!(err.to_string(), "No results");
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("nope"));
        assert_eq!(handle.calls(), vec![("get".to_string(), json!("nope"))]);
    }

    #[tokio::test]
    async fn test_collection_read_forces_include_docs() {
        let handle = RecordingHandle::new();
        let adapter = adapter_with(handle.clone());

        let target = Target::model(json!({}));
        let data = doc(json!({"include_docs": false, "limit": 5}));
        adapter.sync(Verb::Read, &target, Some(data)).await.unwrap();

        let calls = handle.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "all");
        assert_eq!(calls[0].1, json!({"include_docs": true, "limit": 5}));
    }

    #[tokio::test]
    async fn test_collection_read_uses_view_name() {
        let handle = RecordingHandle::new();
        let adapter = adapter_with(handle.clone());

        let mut target = Target::model(json!({}));
        target.view_name = Some("Tasks/all".into());
        adapter.sync(Verb::Read, &target, None).await.unwrap();

        let calls = handle.calls();
        assert_eq!(calls[0].0, "view");
        assert_eq!(calls[0].1["name"], "Tasks/all");
        assert_eq!(calls[0].1["query"], json!({"include_docs": true}));
    }

    #[tokio::test]
    async fn test_update_sends_full_document() {
        let handle = RecordingHandle::new();
        let adapter = adapter_with(handle.clone());

        let target = Target::model(json!({"_id": "t1", "name": "Y", "done": false}));
        let response = adapter.sync(Verb::Update, &target, None).await.unwrap();
        assert!(matches!(response, SyncResponse::Updated { .. }));

        let calls = handle.calls();
        assert_eq!(calls[0].0, "save_with_id");
        assert_eq!(calls[0].1["id"], "t1");
        assert_eq!(calls[0].1["doc"], json!({"_id": "t1", "name": "Y", "done": false}));
    }

    #[tokio::test]
    async fn test_update_without_id_fails() {
        let handle = RecordingHandle::new();
        let adapter = adapter_with(handle.clone());

        let target = Target::model(json!({"name": "Y"}));
        let err = adapter.sync(Verb::Update, &target, None).await.unwrap_err();
        assert!(matches!(err, SyncError::MissingId(Verb::Update)));
        assert!(handle.calls().is_empty());
    }

    #[tokio::test]
    async fn test_merge_strategy_keeps_stored_fields() {
        let db = Arc::new(MemoryDatabase::new("merge"));
        db.save(doc(json!({"_id": "t1", "name": "X", "tags": ["a"]})))
            .await
            .unwrap();

        let adapter = SyncAdapter::builder()
            .default_database(db.clone())
            .connector(Arc::new(MemoryServer::new()))
            .update_strategy(UpdateStrategy::Merge)
            .build()
            .unwrap();

        let target = Target::model(json!({"_id": "t1", "name": "Y"}));
        adapter.sync(Verb::Update, &target, None).await.unwrap();

        let stored = db.get("t1").await.unwrap();
        assert_eq!(stored["name"], "Y");
        assert_eq!(stored["tags"], json!(["a"]));
    }

    #[tokio::test]
    async fn test_create_then_delete() {
        let handle = RecordingHandle::new();
        let adapter = adapter_with(handle.clone());

        let target = Target::model(json!({"name": "A"}));
        let created = adapter.sync(Verb::Create, &target, None).await.unwrap();
        let SyncResponse::Created { id, rev } = created else {
            panic!("expected a create envelope");
        };
        assert!(!id.is_empty());
        assert!(!rev.is_empty());

        let target = Target::model(json!({"_id": id}));
        let deleted = adapter.sync(Verb::Delete, &target, None).await.unwrap();
        assert!(deleted.revision().unwrap().starts_with("2-"));
    }

    #[tokio::test]
    async fn test_sync_named_rejects_unknown_method() {
        let adapter = adapter_with(RecordingHandle::new());
        let outcome = Arc::new(Mutex::new(None));
        let seen = outcome.clone();

        let target = Target::model(json!({"_id": "t1"}));
        adapter
            .sync_named(
                "patch",
                &target,
                SyncOptions::new()
                    .on_success(|_| panic!("unexpected success"))
                    .on_error(move |err| *seen.lock().unwrap() = Some(err.to_string())),
            )
            .await;

        assert_eq!(
            outcome.lock().unwrap().as_deref(),
            Some("Unknown sync method 'patch'")
        );
    }

    #[tokio::test]
    async fn test_spawn_sync_returns_target() {
        let adapter = adapter_with(RecordingHandle::new());
        let (tx, rx) = tokio::sync::oneshot::channel();

        let target = Target::model(json!({"name": "spawned"}));
        let handle = adapter.spawn_sync(
            Verb::Create,
            target,
            SyncOptions::new().on_success(move |res| {
                let _ = tx.send(res);
            }),
        );

        let target = handle.await.unwrap();
        assert_eq!(target.attributes["name"], "spawned");
        assert!(matches!(rx.await.unwrap(), SyncResponse::Created { .. }));
    }
}
