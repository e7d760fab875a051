//! Top-level named list owned by one user.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Store-assigned list identifier, unique within the owner's collection.
pub type ListId = String;

/// Persisted list read model.
///
/// Lists are never renamed; the only lifecycle events are create and
/// cascade delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    pub id: ListId,
    pub name: String,
    pub owner_id: UserId,
    /// Owner email at creation time.
    pub created_by: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}
