//! List and task stores over the document store port.
//!
//! # Responsibility
//! - Define the CRUD contract for lists and tasks scoped to one user.
//! - Map domain records to/from document bodies.
//!
//! # Invariants
//! - Validation runs before any remote call; rejected input never reaches
//!   the document store.
//! - Stores cache nothing; every read round-trips to the document store.
//! - Read paths reject malformed documents instead of masking them.

pub mod list_store;
pub mod task_store;

use crate::model::todo_list::ListId;
use crate::model::validation::ValidationError;
use crate::store::{Document, Fields, StoreError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from list/task store operations.
#[derive(Debug)]
pub enum RepoError {
    /// Input rejected; no remote call was made.
    Validation(ValidationError),
    /// A remote store request failed.
    Remote(StoreError),
    /// A stored document does not decode into a valid record.
    InvalidData(String),
    /// Some task deletions of a cascade failed; the list is still marked
    /// `deleting` and is finished by `ListStore::reconcile`.
    CascadeIncomplete { list_id: ListId, failed: usize },
}

impl RepoError {
    /// Whether the failure came from (or was left behind by) the remote store.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::CascadeIncomplete { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Remote(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
            Self::CascadeIncomplete { list_id, failed } => write!(
                f,
                "cascade delete of list {list_id} incomplete: {failed} task deletion(s) failed"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Remote(err) => Some(err),
            Self::InvalidData(_) | Self::CascadeIncomplete { .. } => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Remote(value)
    }
}

/// Field carrying the cascade-delete marker on a list document.
pub(crate) const DELETING_FIELD: &str = "deleting";

/// Whether a raw list body carries the cascade-delete marker.
pub(crate) fn is_marked_deleting(fields: &Fields) -> bool {
    fields
        .get(DELETING_FIELD)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Reads an explicit `null` the same as an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn encode<T: Serialize>(record: &T) -> RepoResult<Fields> {
    match serde_json::to_value(record) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(RepoError::InvalidData(format!(
            "record encoded as non-object: {other}"
        ))),
        Err(err) => Err(RepoError::InvalidData(err.to_string())),
    }
}

fn decode<T: DeserializeOwned>(doc: Document) -> RepoResult<(String, T)> {
    let Document { id, fields } = doc;
    serde_json::from_value(Value::Object(fields))
        .map(|record| (id.clone(), record))
        .map_err(|err| RepoError::InvalidData(format!("document {id}: {err}")))
}
