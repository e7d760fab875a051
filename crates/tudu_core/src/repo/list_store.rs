//! Top-level list CRUD and cascade delete.
//!
//! # Responsibility
//! - Create and enumerate a user's lists.
//! - Delete a list together with every task under it.
//!
//! # Invariants
//! - Lists live at `users/{owner}/todoLists/{list}`.
//! - A list document is only deleted after all of its tasks are gone.
//! - While a cascade is in flight or incomplete, the list carries the
//!   `deleting` marker and is hidden from `list_lists`.

use crate::model::now_epoch_ms;
use crate::model::todo_list::{ListId, TodoList};
use crate::model::user::User;
use crate::model::validation::validate_list_name;
use crate::repo::task_store::TaskStore;
use crate::model::task::Task;
use crate::repo::{decode, encode, null_as_default, RepoError, RepoResult, DELETING_FIELD};
use crate::store::{CollectionPath, DocumentStore, StoreError};
use futures::future::join_all;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

const MAX_CASCADE_PASSES: usize = 3;

/// Stored list body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListRecord {
    name: String,
    owner_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    created_by: String,
    #[serde(default, deserialize_with = "null_as_default")]
    created_at: i64,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "std::ops::Not::not"
    )]
    deleting: bool,
}

/// Outcome of one `ListStore::reconcile` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Marked lists whose cascade completed during this pass.
    pub lists_finished: usize,
    /// Tasks removed during this pass.
    pub tasks_removed: usize,
    /// Marked lists that still have undeletable tasks.
    pub lists_pending: usize,
}

/// List store over a shared document store.
#[derive(Clone)]
pub struct ListStore {
    store: Arc<dyn DocumentStore>,
    tasks: TaskStore,
}

impl ListStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let tasks = TaskStore::new(Arc::clone(&store));
        Self { store, tasks }
    }

    /// Creates a list and returns its store-assigned id.
    ///
    /// # Contract
    /// - Blank name fails with `Validation` before any remote call.
    /// - The name is stored exactly as given.
    pub async fn create_list(&self, owner: &User, name: &str) -> RepoResult<ListId> {
        validate_list_name(name)?;
        let record = ListRecord {
            name: name.to_string(),
            owner_id: owner.id.clone(),
            created_by: owner.email.clone(),
            created_at: now_epoch_ms(),
            deleting: false,
        };
        let collection = CollectionPath::todo_lists(&owner.id);
        let list_id = self
            .store
            .add(&collection, encode(&record)?)
            .await
            .map_err(|err| {
                error!("event=list_create module=list_store status=error error={err}");
                err
            })?;
        info!("event=list_create module=list_store status=ok list_id={list_id}");
        Ok(list_id)
    }

    /// Lists the owner's visible lists. Order is unspecified.
    pub async fn list_lists(&self, owner: &User) -> RepoResult<Vec<TodoList>> {
        let records = self.load_records(owner).await?;
        Ok(records
            .into_iter()
            .filter(|(_, record)| !record.deleting)
            .map(|(id, record)| TodoList {
                id,
                name: record.name,
                owner_id: record.owner_id,
                created_by: record.created_by,
                created_at: record.created_at,
            })
            .collect())
    }

    /// Deletes a list and every task under it.
    ///
    /// # Contract
    /// - The list is marked `deleting` first; a missing list fails here
    ///   with `Remote(NotFound)` and nothing else is touched.
    /// - Task deletions are issued concurrently and all are awaited.
    /// - When any task deletion fails, the list document is kept (marked)
    ///   and `CascadeIncomplete` is returned.
    pub async fn delete_list(&self, owner: &User, list_id: &ListId) -> RepoResult<()> {
        let started_at = Instant::now();
        let doc = CollectionPath::todo_lists(&owner.id).doc(list_id.as_str());
        let mut marker = serde_json::Map::new();
        marker.insert(DELETING_FIELD.to_string(), json!(true));
        self.store.update(&doc, marker).await.map_err(|err| {
            error!(
                "event=list_delete module=list_store status=error stage=mark list_id={list_id} error={err}"
            );
            err
        })?;

        let removed = self.finish_cascade(owner, list_id).await?;
        info!(
            "event=list_delete module=list_store status=ok list_id={list_id} tasks_removed={removed} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Finishes cascade deletes left incomplete by earlier failures.
    ///
    /// Lists that fail again stay marked and are counted as pending; other
    /// remote failures abort the pass.
    pub async fn reconcile(&self, owner: &User) -> RepoResult<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let marked: Vec<ListId> = self
            .load_records(owner)
            .await?
            .into_iter()
            .filter(|(_, record)| record.deleting)
            .map(|(id, _)| id)
            .collect();

        for list_id in &marked {
            match self.finish_cascade(owner, list_id).await {
                Ok(removed) => {
                    report.lists_finished += 1;
                    report.tasks_removed += removed;
                }
                Err(RepoError::CascadeIncomplete { .. }) => report.lists_pending += 1,
                Err(err) => return Err(err),
            }
        }

        info!(
            "event=list_reconcile module=list_store status=ok marked={} finished={} pending={} tasks_removed={}",
            marked.len(),
            report.lists_finished,
            report.lists_pending,
            report.tasks_removed
        );
        Ok(report)
    }

    async fn load_records(&self, owner: &User) -> RepoResult<Vec<(ListId, ListRecord)>> {
        let collection = CollectionPath::todo_lists(&owner.id);
        let docs = self.store.get_all(&collection).await?;
        docs.into_iter().map(decode::<ListRecord>).collect()
    }

    /// Deletes all tasks of a marked list, then the list itself.
    /// Returns the number of tasks removed.
    ///
    /// The task collection is re-read after each pass; the parent is only
    /// deleted once a read comes back empty.
    async fn finish_cascade(&self, owner: &User, list_id: &ListId) -> RepoResult<usize> {
        let mut removed = 0;
        let mut passes = 0;
        loop {
            let tasks = self.tasks.list_tasks(owner, list_id).await?;
            if tasks.is_empty() {
                break;
            }
            passes += 1;
            if passes > MAX_CASCADE_PASSES {
                warn!(
                    "event=list_delete module=list_store status=error stage=cascade list_id={list_id} reason=tasks_reappearing remaining={}",
                    tasks.len()
                );
                return Err(RepoError::CascadeIncomplete {
                    list_id: list_id.clone(),
                    failed: tasks.len(),
                });
            }
            removed += self.delete_tasks(owner, list_id, &tasks).await?;
        }

        let doc = CollectionPath::todo_lists(&owner.id).doc(list_id.as_str());
        self.store.delete(&doc).await.map_err(|err| {
            error!(
                "event=list_delete module=list_store status=error stage=parent list_id={list_id} error={err}"
            );
            err
        })?;
        Ok(removed)
    }

    /// Deletes `tasks` concurrently, awaiting every outcome.
    async fn delete_tasks(
        &self,
        owner: &User,
        list_id: &ListId,
        tasks: &[Task],
    ) -> RepoResult<usize> {
        let outcomes = join_all(
            tasks
                .iter()
                .map(|task| self.tasks.delete_task(owner, list_id, &task.id)),
        )
        .await;

        let mut removed = 0;
        let mut failed = 0;
        for outcome in outcomes {
            match outcome {
                Ok(()) => removed += 1,
                // Already gone.
                Err(RepoError::Remote(StoreError::NotFound(_))) => {}
                Err(_) => failed += 1,
            }
        }
        if failed > 0 {
            warn!(
                "event=list_delete module=list_store status=error stage=cascade list_id={list_id} failed={failed} removed={removed}"
            );
            return Err(RepoError::CascadeIncomplete {
                list_id: list_id.clone(),
                failed,
            });
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::ListStore;
    use crate::model::user::User;
    use crate::model::validation::ValidationError;
    use crate::repo::RepoError;
    use crate::store::memory::MemoryDocumentStore;
    use crate::store::{CollectionPath, DocumentStore, StoreError};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn blank_name_is_rejected_without_remote_call() {
        let backend = MemoryDocumentStore::new();
        let store = ListStore::new(Arc::new(backend.clone()));
        let owner = User::new("u1", "u1@example.com");

        let err = store.create_list(&owner, " ").await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::EmptyListName)
        ));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn deleting_missing_list_is_a_remote_not_found() {
        let store = ListStore::new(Arc::new(MemoryDocumentStore::new()));
        let owner = User::new("u1", "u1@example.com");

        let err = store
            .delete_list(&owner, &"missing".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Remote(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn lists_are_namespaced_per_user() {
        let store = ListStore::new(Arc::new(MemoryDocumentStore::new()));
        let alice = User::new("alice", "alice@example.com");
        let bob = User::new("bob", "bob@example.com");

        store.create_list(&alice, "Groceries").await.unwrap();
        assert_eq!(store.list_lists(&alice).await.unwrap().len(), 1);
        assert!(store.list_lists(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reconcile_sweeps_tasks_written_under_a_marked_list() {
        let backend = MemoryDocumentStore::new();
        let store = ListStore::new(Arc::new(backend.clone()));
        let owner = User::new("u1", "u1@example.com");
        let list_id = store.create_list(&owner, "Closing").await.unwrap();

        backend
            .update(
                &CollectionPath::todo_lists("u1").doc(list_id.as_str()),
                json!({"deleting": true}).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();
        let tasks = CollectionPath::tasks("u1", &list_id);
        for title in ["late a", "late b"] {
            backend
                .add(&tasks, json!({"title": title}).as_object().cloned().unwrap())
                .await
                .unwrap();
        }

        let report = store.reconcile(&owner).await.unwrap();
        assert_eq!(report.lists_finished, 1);
        assert_eq!(report.tasks_removed, 2);
        assert_eq!(backend.document_count(), 0);
    }
}
