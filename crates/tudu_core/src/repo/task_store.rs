//! Task CRUD scoped to a (user, list) pair.
//!
//! # Invariants
//! - Tasks live at `users/{owner}/todoLists/{list}/tasks/{task}`.
//! - `update_task` writes the complete editable set: `title`,
//!   `description`, `dueDate` and `priority`.
//! - Deleting an absent task surfaces `RepoError::Remote(NotFound)`.
//! - Tasks are only created under a list that exists and is not marked
//!   for deletion.

use crate::model::now_epoch_ms;
use crate::model::task::{due_date_format, NewTask, Priority, Task, TaskFields, TaskId};
use crate::model::todo_list::ListId;
use crate::model::user::User;
use crate::repo::{decode, encode, is_marked_deleting, null_as_default, RepoResult};
use crate::store::{CollectionPath, DocPath, DocumentStore, StoreError};
use chrono::NaiveDate;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Stored task body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(default, with = "due_date_format")]
    due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    created_at: i64,
}

/// Full-replace body written by updates. `createdAt` is left untouched.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskUpdate<'a> {
    title: &'a str,
    description: &'a str,
    #[serde(with = "due_date_format")]
    due_date: Option<NaiveDate>,
    priority: Priority,
}

/// Task store over a shared document store.
#[derive(Clone)]
pub struct TaskStore {
    store: Arc<dyn DocumentStore>,
}

impl TaskStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates a task and returns its store-assigned id.
    ///
    /// # Contract
    /// - Blank title fails with `Validation` before any remote call.
    /// - Missing priority is stored as `low`.
    /// - A list that is absent or marked for deletion fails with
    ///   `Remote(NotFound)` and nothing is written.
    pub async fn create_task(
        &self,
        owner: &User,
        list_id: &ListId,
        input: NewTask,
    ) -> RepoResult<TaskId> {
        input.validate()?;
        self.require_open_list(owner, list_id).await?;
        let fields = input.into_fields();
        let record = TaskRecord {
            title: fields.title,
            description: fields.description,
            due_date: fields.due_date,
            priority: fields.priority,
            created_at: now_epoch_ms(),
        };
        let collection = CollectionPath::tasks(&owner.id, list_id);
        match self.store.add(&collection, encode(&record)?).await {
            Ok(task_id) => {
                info!(
                    "event=task_create module=task_store status=ok list_id={list_id} task_id={task_id} priority={}",
                    record.priority
                );
                Ok(task_id)
            }
            Err(err) => {
                error!(
                    "event=task_create module=task_store status=error list_id={list_id} error={err}"
                );
                Err(err.into())
            }
        }
    }

    /// Replaces every editable field of one task.
    pub async fn update_task(
        &self,
        owner: &User,
        list_id: &ListId,
        task_id: &TaskId,
        fields: &TaskFields,
    ) -> RepoResult<()> {
        fields.validate()?;
        let body = encode(&TaskUpdate {
            title: &fields.title,
            description: &fields.description,
            due_date: fields.due_date,
            priority: fields.priority,
        })?;
        let doc = task_doc(owner, list_id, task_id);
        self.store.update(&doc, body).await.map_err(|err| {
            error!(
                "event=task_update module=task_store status=error list_id={list_id} task_id={task_id} error={err}"
            );
            err
        })?;
        info!("event=task_update module=task_store status=ok list_id={list_id} task_id={task_id}");
        Ok(())
    }

    /// Deletes one task.
    pub async fn delete_task(
        &self,
        owner: &User,
        list_id: &ListId,
        task_id: &TaskId,
    ) -> RepoResult<()> {
        let doc = task_doc(owner, list_id, task_id);
        self.store.delete(&doc).await.map_err(|err| {
            error!(
                "event=task_delete module=task_store status=error list_id={list_id} task_id={task_id} error={err}"
            );
            err
        })?;
        info!("event=task_delete module=task_store status=ok list_id={list_id} task_id={task_id}");
        Ok(())
    }

    /// Lists every task of one list. Order is unspecified.
    pub async fn list_tasks(&self, owner: &User, list_id: &ListId) -> RepoResult<Vec<Task>> {
        let collection = CollectionPath::tasks(&owner.id, list_id);
        let docs = self.store.get_all(&collection).await?;
        docs.into_iter()
            .map(|doc| {
                let (id, record) = decode::<TaskRecord>(doc)?;
                Ok(Task {
                    id,
                    list_id: list_id.clone(),
                    title: record.title,
                    description: record.description,
                    due_date: record.due_date,
                    priority: record.priority,
                    created_at: record.created_at,
                })
            })
            .collect()
    }

    async fn require_open_list(&self, owner: &User, list_id: &ListId) -> RepoResult<()> {
        let collection = CollectionPath::todo_lists(&owner.id);
        let lists = self.store.get_all(&collection).await?;
        let open = lists
            .iter()
            .any(|doc| &doc.id == list_id && !is_marked_deleting(&doc.fields));
        if !open {
            warn!(
                "event=task_create module=task_store status=error list_id={list_id} reason=list_missing"
            );
            return Err(StoreError::NotFound(collection.doc(list_id.as_str())).into());
        }
        Ok(())
    }
}

fn task_doc(owner: &User, list_id: &ListId, task_id: &TaskId) -> DocPath {
    CollectionPath::tasks(&owner.id, list_id).doc(task_id.as_str())
}

#[cfg(test)]
mod tests {
    use super::TaskStore;
    use crate::model::task::{NewTask, Priority, TaskFields};
    use crate::model::user::User;
    use crate::model::validation::ValidationError;
    use crate::repo::list_store::ListStore;
    use crate::repo::RepoError;
    use crate::store::memory::MemoryDocumentStore;
    use crate::store::{CollectionPath, DocumentStore, StoreError};
    use serde_json::json;
    use std::sync::Arc;

    fn owner() -> User {
        User::new("u1", "u1@example.com")
    }

    #[tokio::test]
    async fn blank_title_is_rejected_without_remote_call() {
        let backend = MemoryDocumentStore::new();
        let store = TaskStore::new(Arc::new(backend.clone()));

        let err = store
            .create_task(&owner(), &"l1".to_string(), NewTask::titled("  "))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::EmptyTaskTitle)
        ));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn update_writes_complete_editable_set() {
        let backend = MemoryDocumentStore::new();
        let store = TaskStore::new(Arc::new(backend.clone()));
        let list_id = ListStore::new(Arc::new(backend.clone()))
            .create_list(&owner(), "Groceries")
            .await
            .unwrap();

        let mut input = NewTask::titled("Buy milk");
        input.description = "2 litres".to_string();
        input.priority = Some(Priority::High);
        let task_id = store.create_task(&owner(), &list_id, input).await.unwrap();

        let replacement = TaskFields {
            title: "Buy oat milk".to_string(),
            ..TaskFields::default()
        };
        store
            .update_task(&owner(), &list_id, &task_id, &replacement)
            .await
            .unwrap();

        let body = backend
            .peek(&CollectionPath::tasks("u1", &list_id).doc(task_id.as_str()))
            .unwrap();
        assert_eq!(body["title"], json!("Buy oat milk"));
        assert_eq!(body["description"], json!(""));
        assert_eq!(body["dueDate"], json!(""));
        assert_eq!(body["priority"], json!("low"));
        assert!(body["createdAt"].as_i64().is_some());
    }

    #[tokio::test]
    async fn task_under_missing_list_is_not_created() {
        let backend = MemoryDocumentStore::new();
        let store = TaskStore::new(Arc::new(backend.clone()));

        let err = store
            .create_task(&owner(), &"no-such-list".to_string(), NewTask::titled("orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Remote(StoreError::NotFound(_))));
        assert_eq!(backend.document_count(), 0);
    }

    #[tokio::test]
    async fn task_under_list_marked_for_deletion_is_not_created() {
        let backend = MemoryDocumentStore::new();
        let store = TaskStore::new(Arc::new(backend.clone()));
        let list_id = ListStore::new(Arc::new(backend.clone()))
            .create_list(&owner(), "Closing")
            .await
            .unwrap();
        backend
            .update(
                &CollectionPath::todo_lists("u1").doc(list_id.as_str()),
                json!({"deleting": true}).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();

        let err = store
            .create_task(&owner(), &list_id, NewTask::titled("late"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Remote(StoreError::NotFound(_))));
        assert!(store.list_tasks(&owner(), &list_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn legacy_task_without_priority_reads_as_low() {
        let backend = MemoryDocumentStore::new();
        let collection = CollectionPath::tasks("u1", "l1");
        backend
            .add(
                &collection,
                json!({"title": "Old task"}).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();
        backend
            .add(
                &collection,
                json!({"title": "Nulls", "description": null, "priority": null, "dueDate": null})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();

        let store = TaskStore::new(Arc::new(backend));
        let tasks = store.list_tasks(&owner(), &"l1".to_string()).await.unwrap();
        assert_eq!(tasks.len(), 2);
        for task in &tasks {
            assert_eq!(task.priority, Priority::Low);
            assert_eq!(task.description, "");
            assert_eq!(task.due_date, None);
        }
    }
}
