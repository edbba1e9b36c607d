//! In-memory document databases
//!
//! Mirrors the CouchDB behaviours the sync adapter relies on: revision
//! tokens that change on every write, conflict detection for stale `_rev`
//! values, tombstones on delete, and map-only views sorted by key.

use super::{Connector, DatabaseHandle, DbHandle, collate};
use crate::core::{
    DbError, DbResult, Document, ID_FIELD, QueryOptions, REV_FIELD, RemoveResponse,
    SaveResponse, ViewRow, document_id, document_rev,
};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock as StdRwLock};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Map function of a view: emits `(key, value)` pairs for a document.
pub type MapFn = Arc<dyn Fn(&Document) -> Vec<(Value, Value)> + Send + Sync>;

struct StoredDoc {
    rev: String,
    body: Document,
    deleted: bool,
}

struct DatabaseState {
    exists: bool,
    docs: BTreeMap<String, StoredDoc>,
}

/// A single in-memory database.
pub struct MemoryDatabase {
    name: String,
    state: RwLock<DatabaseState>,
    views: StdRwLock<HashMap<String, MapFn>>,
}

fn next_rev(previous: Option<&str>) -> String {
    let generation = previous
        .and_then(|rev| rev.split('-').next())
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or(0);
    format!("{}-{}", generation + 1, Uuid::new_v4().simple())
}

impl MemoryDatabase {
    /// Create an empty database that already exists.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(DatabaseState {
                exists: true,
                docs: BTreeMap::new(),
            }),
            views: StdRwLock::new(HashMap::new()),
        }
    }

    /// Register a view under `"design/view"`.
    pub fn define_view<F>(&self, view_name: &str, map: F)
    where
        F: Fn(&Document) -> Vec<(Value, Value)> + Send + Sync + 'static,
    {
        let mut views = self.views.write().unwrap_or_else(PoisonError::into_inner);
        views.insert(view_name.to_string(), Arc::new(map));
    }

    /// Create the database. Fails if it already exists.
    pub async fn create(&self) -> DbResult<()> {
        let mut state = self.state.write().await;
        if state.exists {
            return Err(DbError::DatabaseExists(self.name.clone()));
        }
        state.exists = true;
        state.docs.clear();
        Ok(())
    }

    /// Drop the database and all of its documents.
    pub async fn destroy(&self) -> DbResult<()> {
        let mut state = self.state.write().await;
        if !state.exists {
            return Err(DbError::DatabaseNotFound(self.name.clone()));
        }
        state.exists = false;
        state.docs.clear();
        Ok(())
    }

    pub async fn exists(&self) -> bool {
        self.state.read().await.exists
    }

    /// Number of live (non-deleted) documents.
    pub async fn doc_count(&self) -> usize {
        let state = self.state.read().await;
        state.docs.values().filter(|d| !d.deleted).count()
    }

    /// Save several documents; each entry succeeds or fails on its own.
    pub async fn bulk_save(&self, docs: Vec<Document>) -> Vec<DbResult<SaveResponse>> {
        join_all(docs.into_iter().map(|doc| self.save(doc))).await
    }

    fn ensure_exists(&self, state: &DatabaseState) -> DbResult<()> {
        if state.exists {
            Ok(())
        } else {
            Err(DbError::DatabaseNotFound(self.name.clone()))
        }
    }

    async fn write(&self, id: String, mut doc: Document) -> DbResult<SaveResponse> {
        let mut state = self.state.write().await;
        self.ensure_exists(&state)?;

        let supplied = document_rev(&doc).map(str::to_string);
        let previous = match state.docs.get(&id) {
            Some(stored) => {
                // A tombstone may be overwritten without a revision.
                let stale = match &supplied {
                    Some(rev) => rev != &stored.rev,
                    None => false,
                };
                if stale {
                    return Err(DbError::Conflict(id));
                }
                Some(stored.rev.clone())
            }
            None if supplied.is_some() => return Err(DbError::Conflict(id)),
            None => None,
        };

        let rev = next_rev(previous.as_deref());
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        doc.insert(REV_FIELD.to_string(), Value::String(rev.clone()));
        state.docs.insert(
            id.clone(),
            StoredDoc {
                rev: rev.clone(),
                body: doc,
                deleted: false,
            },
        );

        Ok(SaveResponse { id, rev })
    }
}

fn flag(query: &QueryOptions, name: &str) -> Option<bool> {
    query.get(name).and_then(Value::as_bool)
}

fn count(query: &QueryOptions, name: &str) -> Option<usize> {
    query
        .get(name)
        .and_then(Value::as_u64)
        .map(|n| n as usize)
}

/// Apply `key`, `startkey`, `endkey`, `inclusive_end`, `descending`, `skip`
/// and `limit` to rows already sorted in ascending key order.
fn apply_query(mut rows: Vec<ViewRow>, query: &QueryOptions) -> Vec<ViewRow> {
    use std::cmp::Ordering;

    let descending = flag(query, "descending").unwrap_or(false);
    let inclusive_end = flag(query, "inclusive_end").unwrap_or(true);
    if descending {
        rows.reverse();
    }

    let key = query.get("key");
    let start = query.get("startkey");
    let end = query.get("endkey");

    rows.retain(|row| {
        if let Some(key) = key {
            if collate(&row.key, key) != Ordering::Equal {
                return false;
            }
        }
        if let Some(start) = start {
            let ord = collate(&row.key, start);
            let before_start = if descending {
                ord == Ordering::Greater
            } else {
                ord == Ordering::Less
            };
            if before_start {
                return false;
            }
        }
        if let Some(end) = end {
            let ord = collate(&row.key, end);
            let past_end = match (descending, inclusive_end) {
                (false, true) => ord == Ordering::Greater,
                (false, false) => ord != Ordering::Less,
                (true, true) => ord == Ordering::Less,
                (true, false) => ord != Ordering::Greater,
            };
            if past_end {
                return false;
            }
        }
        true
    });

    let skip = count(query, "skip").unwrap_or(0);
    let limit = count(query, "limit").unwrap_or(usize::MAX);
    rows.into_iter().skip(skip).take(limit).collect()
}

#[async_trait]
impl DatabaseHandle for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, id: &str) -> DbResult<Document> {
        let state = self.state.read().await;
        self.ensure_exists(&state)?;

        match state.docs.get(id) {
            Some(stored) if stored.deleted => Err(DbError::not_found(id, "deleted")),
            Some(stored) => Ok(stored.body.clone()),
            None => Err(DbError::not_found(id, "missing")),
        }
    }

    async fn view(&self, view_name: &str, query: &QueryOptions) -> DbResult<Vec<ViewRow>> {
        let map = {
            let views = self.views.read().unwrap_or_else(PoisonError::into_inner);
            views
                .get(view_name)
                .cloned()
                .ok_or_else(|| DbError::ViewNotFound(view_name.to_string()))?
        };

        let include_docs = flag(query, "include_docs").unwrap_or(false);
        let state = self.state.read().await;
        self.ensure_exists(&state)?;

        let mut rows = Vec::new();
        for (id, stored) in state.docs.iter().filter(|(_, d)| !d.deleted) {
            for (key, value) in map(&stored.body) {
                rows.push(ViewRow {
                    id: Some(id.clone()),
                    key,
                    value,
                    doc: include_docs.then(|| stored.body.clone()),
                });
            }
        }

        rows.sort_by(|a, b| collate(&a.key, &b.key).then_with(|| a.id.cmp(&b.id)));
        Ok(apply_query(rows, query))
    }

    async fn all(&self, query: &QueryOptions) -> DbResult<Vec<ViewRow>> {
        let include_docs = flag(query, "include_docs").unwrap_or(false);
        let state = self.state.read().await;
        self.ensure_exists(&state)?;

        let rows = state
            .docs
            .iter()
            .filter(|(_, d)| !d.deleted)
            .map(|(id, stored)| ViewRow {
                id: Some(id.clone()),
                key: Value::String(id.clone()),
                value: json!({ "rev": stored.rev }),
                doc: include_docs.then(|| stored.body.clone()),
            })
            .collect();

        Ok(apply_query(rows, query))
    }

    async fn save(&self, doc: Document) -> DbResult<SaveResponse> {
        let id = match document_id(&doc) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };
        self.write(id, doc).await
    }

    async fn save_with_id(&self, id: &str, doc: Document) -> DbResult<SaveResponse> {
        if id.is_empty() {
            return Err(DbError::InvalidDocument("document id cannot be empty".into()));
        }
        self.write(id.to_string(), doc).await
    }

    async fn remove(&self, id: &str) -> DbResult<RemoveResponse> {
        let mut state = self.state.write().await;
        self.ensure_exists(&state)?;

        let stored = match state.docs.get_mut(id) {
            Some(stored) if stored.deleted => return Err(DbError::not_found(id, "deleted")),
            Some(stored) => stored,
            None => return Err(DbError::not_found(id, "missing")),
        };

        let rev = next_rev(Some(&stored.rev));
        let mut tombstone = Document::new();
        tombstone.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        tombstone.insert(REV_FIELD.to_string(), Value::String(rev.clone()));
        tombstone.insert("_deleted".to_string(), Value::Bool(true));

        stored.rev = rev.clone();
        stored.body = tombstone;
        stored.deleted = true;

        Ok(RemoveResponse {
            id: id.to_string(),
            rev,
        })
    }
}

/// A set of named in-memory databases.
///
/// Asking for the same name twice yields the same database. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct MemoryServer {
    databases: Arc<Mutex<HashMap<String, Arc<MemoryDatabase>>>>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed access to a database, creating it on first use.
    pub fn open(&self, name: &str) -> Arc<MemoryDatabase> {
        let mut databases = self.databases.lock().unwrap_or_else(PoisonError::into_inner);
        databases
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryDatabase::new(name)))
            .clone()
    }

    pub fn database_names(&self) -> Vec<String> {
        let databases = self.databases.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = databases.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Connector for MemoryServer {
    fn database(&self, name: &str) -> DbHandle {
        self.open(name)
    }
}
