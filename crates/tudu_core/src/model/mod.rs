//! Domain model for the list/task hierarchy.
//!
//! # Responsibility
//! - Define users, lists, tasks and the snapshot read model.
//! - Hold the field-level validation shared by every write path.
//!
//! # Invariants
//! - A task always belongs to exactly one list, a list to exactly one user.
//! - `Priority` is closed over `low|medium|high` and defaults to `low`.

pub mod snapshot;
pub mod task;
pub mod todo_list;
pub mod user;
pub mod validation;

/// Current wall-clock time as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
