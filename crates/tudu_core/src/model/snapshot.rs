//! Snapshot read model: a user's lists with their resolved tasks.
//!
//! # Invariants
//! - A snapshot is built wholesale and never patched in place.
//! - Lists and tasks are presented sorted by `(created_at, id)`.

use crate::model::task::{Task, TaskId};
use crate::model::todo_list::{ListId, TodoList};

/// One list together with its tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotList {
    pub list: TodoList,
    pub tasks: Vec<Task>,
}

/// Full in-memory materialization of one user's hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    lists: Vec<SnapshotList>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot from fetched lists, normalizing presentation order.
    pub fn new(mut lists: Vec<SnapshotList>) -> Self {
        lists.sort_by(|a, b| {
            (a.list.created_at, &a.list.id).cmp(&(b.list.created_at, &b.list.id))
        });
        for entry in &mut lists {
            entry
                .tasks
                .sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        }
        Self { lists }
    }

    pub fn lists(&self) -> &[SnapshotList] {
        &self.lists
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    pub fn task_count(&self) -> usize {
        self.lists.iter().map(|entry| entry.tasks.len()).sum()
    }

    pub fn find_list(&self, list_id: &str) -> Option<&SnapshotList> {
        self.lists.iter().find(|entry| entry.list.id == list_id)
    }

    pub fn find_task(&self, list_id: &ListId, task_id: &TaskId) -> Option<&Task> {
        self.find_list(list_id)?
            .tasks
            .iter()
            .find(|task| &task.id == task_id)
    }
}
