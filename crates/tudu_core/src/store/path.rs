//! Hierarchical document addressing.
//!
//! Layout:
//! - `users/{userId}/todoLists/{listId}`
//! - `users/{userId}/todoLists/{listId}/tasks/{taskId}`

use std::fmt::{Display, Formatter};

const USERS: &str = "users";
const TODO_LISTS: &str = "todoLists";
const TASKS: &str = "tasks";

/// Path of a document collection, e.g. `users/u1/todoLists`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Collection holding one user's lists.
    pub fn todo_lists(user_id: &str) -> Self {
        Self(format!("{USERS}/{}/{TODO_LISTS}", segment(user_id)))
    }

    /// Collection holding the tasks of one list.
    pub fn tasks(user_id: &str, list_id: &str) -> Self {
        Self(format!(
            "{USERS}/{}/{TODO_LISTS}/{}/{TASKS}",
            segment(user_id),
            segment(list_id)
        ))
    }

    /// Addresses one document inside this collection.
    pub fn doc(&self, doc_id: impl Into<String>) -> DocPath {
        DocPath {
            collection: self.clone(),
            id: doc_id.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `self` is `prefix` or nested below it.
    pub fn starts_with(&self, prefix: &str) -> bool {
        is_within(&self.0, prefix)
    }
}

impl Display for CollectionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    pub collection: CollectionPath,
    pub id: String,
}

impl Display for DocPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Whether `path` equals `prefix` or lies below it, segment-wise.
pub(crate) fn is_within(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

// Ids come from the auth provider or the store; neither should contain a
// separator, but a stray `/` must not let one id address another scope.
fn segment(value: &str) -> String {
    value.replace('/', "%2F")
}
