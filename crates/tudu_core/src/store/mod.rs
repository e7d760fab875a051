//! Document store port and adapters.
//!
//! # Responsibility
//! - Define the opaque collection API the list/task stores talk to.
//! - Provide an in-memory adapter and an SQLite adapter.
//!
//! # Invariants
//! - `add` always generates a fresh id, unique within the collection.
//! - `update` merges fields into an existing document; it never creates one.
//! - `update` and `delete` on a missing document fail with `NotFound`.
//! - Adapters hold no caches beyond their backing state; every call is an
//!   independent request.

pub mod memory;
pub mod path;
pub mod sqlite;

use crate::db::DbError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use path::{CollectionPath, DocPath};

/// Document body: a flat JSON object.
pub type Fields = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// One stored document with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Failure of a single remote store request.
#[derive(Debug)]
pub enum StoreError {
    /// Target document does not exist.
    NotFound(DocPath),
    /// Store could not serve the request (network, outage, injected fault).
    Unavailable(String),
    /// Local backend failure.
    Db(DbError),
    /// Document body could not be encoded/decoded.
    Codec(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "document not found: {path}"),
            Self::Unavailable(message) => write!(f, "document store unavailable: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "invalid document body: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::NotFound(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}

/// Remote document-collection API.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Adds a document with a generated id and returns that id.
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> StoreResult<String>;
    /// Returns every document directly inside `collection`. Order is unspecified.
    async fn get_all(&self, collection: &CollectionPath) -> StoreResult<Vec<Document>>;
    /// Merges `fields` into an existing document.
    async fn update(&self, doc: &DocPath, fields: Fields) -> StoreResult<()>;
    /// Deletes one document.
    async fn delete(&self, doc: &DocPath) -> StoreResult<()>;
}

/// Generates a store document id.
pub(crate) fn generate_doc_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Merges `patch` into `target`, overwriting keys present in both.
pub(crate) fn merge_fields(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}
