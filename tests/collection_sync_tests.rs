/// Collection sync tests
///
/// Loading collections through named views and all-docs queries
/// Run with: cargo test --test collection_sync_tests
use docsync::{
    Collection, DatabaseHandle, DatabaseRef, DbError, Document, MemoryDatabase, MemoryServer, SyncAdapter, SyncError, ViewName,
};
use serde_json::{Value, json};
use std::sync::Arc;

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

/// A database with the `Tasks` design views and ten tasks plus one todo.
async fn seeded() -> (Arc<MemoryDatabase>, SyncAdapter) {
    let server = MemoryServer::new();
    let db = server.open("docsync-test");

    db.define_view("Tasks/all", |d| match d.get("type") {
        Some(t) if t == "Task" => vec![(d["_id"].clone(), json!(1))],
        _ => vec![],
    });
    db.define_view("Tasks/by_name", |d| match (d.get("type"), d.get("name")) {
        (Some(t), Some(name)) if t == "Task" => vec![(name.clone(), json!(1))],
        _ => vec![],
    });

    let mut docs: Vec<Document> = (0..10)
        .map(|i| {
            doc(json!({
                "_id": format!("task_{}", i),
                "type": "Task",
                "name": format!("Task Item {}", i),
            }))
        })
        .collect();
    docs.push(doc(json!({"_id": "todo_1", "type": "Todo", "name": "Todo"})));

    for result in db.bulk_save(docs).await {
        result.unwrap();
    }

    let adapter = SyncAdapter::new(db.clone(), Arc::new(server));
    (db, adapter)
}

#[tokio::test]
async fn test_collection_loading_from_view() {
    let (_, adapter) = seeded().await;
    let mut tasks = Collection::new().with_view_name("Tasks/all");

    let loaded = tasks.fetch(&adapter, None).await.unwrap();

    assert_eq!(loaded, 10);
    assert_eq!(tasks.len(), 10);
    let name = tasks.first().unwrap().get("name").unwrap().as_str().unwrap();
    assert!(name.starts_with("Task Item"));
}

#[tokio::test]
async fn test_collection_loading_sorted_by_view_key() {
    let (_, adapter) = seeded().await;
    let mut tasks = Collection::new().with_view_name("Tasks/by_name");

    tasks.fetch(&adapter, None).await.unwrap();

    assert_eq!(tasks.first().unwrap().get("name"), Some(&json!("Task Item 0")));
    assert_eq!(tasks.last().unwrap().get("name"), Some(&json!("Task Item 9")));
}

#[tokio::test]
async fn test_collection_view_name_from_function() {
    let (_, adapter) = seeded().await;
    let design = "Tasks".to_string();
    let mut tasks =
        Collection::new().with_view_name(ViewName::provider(move || format!("{}/by_name", design)));

    tasks.fetch(&adapter, None).await.unwrap();
    assert_eq!(tasks.len(), 10);
}

#[tokio::test]
async fn test_collection_without_view_reads_all_docs() {
    let (_, adapter) = seeded().await;
    let mut everything = Collection::new();

    everything.fetch(&adapter, None).await.unwrap();

    assert_eq!(everything.len(), 11);
    assert!(everything.get("todo_1").is_some());
    // Full documents, not references.
    assert!(everything.iter().all(|m| m.get("type").is_some()));
}

#[tokio::test]
async fn test_empty_view_name_reads_all_docs() {
    let (_, adapter) = seeded().await;
    let mut everything = Collection::new().with_view_name("");

    everything.fetch(&adapter, None).await.unwrap();
    assert_eq!(everything.len(), 11);
}

#[tokio::test]
async fn test_query_data_is_passed_through() {
    let (_, adapter) = seeded().await;
    let mut tasks = Collection::new().with_view_name("Tasks/by_name");

    let data = doc(json!({"include_docs": false, "descending": true, "limit": 3}));
    tasks.fetch(&adapter, Some(data)).await.unwrap();

    let names: Vec<_> = tasks.iter().map(|m| m.get("name").cloned().unwrap()).collect();
    assert_eq!(
        names,
        vec![json!("Task Item 9"), json!("Task Item 8"), json!("Task Item 7")]
    );
}

#[tokio::test]
async fn test_unknown_view_error_is_forwarded() {
    let (_, adapter) = seeded().await;
    let mut missing = Collection::new().with_view_name("Tasks/nope");

    let err = missing.fetch(&adapter, None).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Backend(DbError::ViewNotFound(ref name)) if name == "Tasks/nope"
    ));
    assert!(missing.is_empty());
}

#[tokio::test]
async fn test_loaded_models_share_collection_database() {
    let (_, adapter) = seeded().await;
    let server = MemoryServer::new();
    let archive = server.open("archive");
    archive
        .save(doc(json!({"_id": "old", "name": "Old"})))
        .await
        .unwrap();

    let mut archived =
        Collection::new().with_database(DatabaseRef::prepared(archive.clone()));
    archived.fetch(&adapter, None).await.unwrap();
    assert_eq!(archived.len(), 1);

    let mut model = archived.first().unwrap().clone();
    model.set("name", "Older");
    model.save(&adapter).await.unwrap();

    assert_eq!(archive.get("old").await.unwrap()["name"], "Older");
}
