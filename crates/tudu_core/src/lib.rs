//! Core logic for Tudu: per-user lists of tasks kept in a document store
//! and mirrored into an in-memory snapshot for the view.

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use auth::{AuthGate, LocalAuthGate, SessionListener, Subscription};
pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::snapshot::{Snapshot, SnapshotList};
pub use model::task::{format_due_date, parse_due_date, NewTask, Priority, Task, TaskFields, TaskId};
pub use model::todo_list::{ListId, TodoList};
pub use model::user::{User, UserId};
pub use model::validation::ValidationError;
pub use repo::list_store::{ListStore, ReconcileReport};
pub use repo::task_store::TaskStore;
pub use repo::{RepoError, RepoResult};
pub use service::edit_session::{EditSession, EditState, EditTarget};
pub use service::session::{InputBuffers, SessionError, SessionResult, TodoSession};
pub use service::sync_controller::SyncController;
pub use store::memory::{MemoryDocumentStore, StoreOp};
pub use store::sqlite::SqliteDocumentStore;
pub use store::{CollectionPath, DocPath, Document, DocumentStore, Fields, StoreError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
