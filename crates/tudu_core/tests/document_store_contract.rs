//! Shared contract checks run against every `DocumentStore` adapter.

use serde_json::json;
use std::collections::HashSet;
use tudu_core::{
    CollectionPath, DocumentStore, Fields, MemoryDocumentStore, SqliteDocumentStore, StoreError,
};

fn fields(value: serde_json::Value) -> Fields {
    value.as_object().cloned().unwrap()
}

async fn add_generates_unique_ids(store: &dyn DocumentStore) {
    let lists = CollectionPath::todo_lists("u1");
    let mut ids = HashSet::new();
    for index in 0..5 {
        let id = store
            .add(&lists, fields(json!({"name": format!("list {index}")})))
            .await
            .unwrap();
        assert!(!id.is_empty());
        assert!(ids.insert(id));
    }
    assert_eq!(store.get_all(&lists).await.unwrap().len(), 5);
}

async fn get_all_only_returns_direct_children(store: &dyn DocumentStore) {
    let lists = CollectionPath::todo_lists("u1");
    let list_id = store
        .add(&lists, fields(json!({"name": "Groceries"})))
        .await
        .unwrap();
    let tasks = CollectionPath::tasks("u1", &list_id);
    store
        .add(&tasks, fields(json!({"title": "Buy milk"})))
        .await
        .unwrap();

    let docs = store.get_all(&lists).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, list_id);
    assert_eq!(docs[0].fields["name"], json!("Groceries"));

    assert!(store
        .get_all(&CollectionPath::todo_lists("u2"))
        .await
        .unwrap()
        .is_empty());
}

async fn update_merges_and_requires_existing_doc(store: &dyn DocumentStore) {
    let tasks = CollectionPath::tasks("u1", "l1");
    let id = store
        .add(&tasks, fields(json!({"title": "a", "priority": "low"})))
        .await
        .unwrap();

    store
        .update(&tasks.doc(id.as_str()), fields(json!({"priority": "high"})))
        .await
        .unwrap();
    let docs = store.get_all(&tasks).await.unwrap();
    assert_eq!(docs[0].fields["title"], json!("a"));
    assert_eq!(docs[0].fields["priority"], json!("high"));

    let err = store
        .update(&tasks.doc("missing"), fields(json!({"title": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert_eq!(store.get_all(&tasks).await.unwrap().len(), 1);
}

async fn delete_removes_once_then_reports_not_found(store: &dyn DocumentStore) {
    let tasks = CollectionPath::tasks("u1", "l1");
    let id = store
        .add(&tasks, fields(json!({"title": "a"})))
        .await
        .unwrap();

    store.delete(&tasks.doc(id.as_str())).await.unwrap();
    assert!(store.get_all(&tasks).await.unwrap().is_empty());

    let err = store.delete(&tasks.doc(id.as_str())).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(path) if path.id == id));
}

macro_rules! contract_tests {
    ($module:ident, $make:expr) => {
        mod $module {
            use super::*;

            #[tokio::test]
            async fn add_generates_unique_ids() {
                super::add_generates_unique_ids(&$make).await;
            }

            #[tokio::test]
            async fn get_all_only_returns_direct_children() {
                super::get_all_only_returns_direct_children(&$make).await;
            }

            #[tokio::test]
            async fn update_merges_and_requires_existing_doc() {
                super::update_merges_and_requires_existing_doc(&$make).await;
            }

            #[tokio::test]
            async fn delete_removes_once_then_reports_not_found() {
                super::delete_removes_once_then_reports_not_found(&$make).await;
            }
        }
    };
}

contract_tests!(memory, MemoryDocumentStore::new());
contract_tests!(sqlite, SqliteDocumentStore::open_in_memory().unwrap());

#[tokio::test]
async fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docs.db");
    let lists = CollectionPath::todo_lists("u1");

    let id = {
        let store = SqliteDocumentStore::open(&path).unwrap();
        store
            .add(&lists, fields(json!({"name": "Groceries"})))
            .await
            .unwrap()
    };

    let store = SqliteDocumentStore::open(&path).unwrap();
    let docs = store.get_all(&lists).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, id);
}
