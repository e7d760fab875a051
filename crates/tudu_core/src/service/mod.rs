//! Session-level use-case services.
//!
//! # Responsibility
//! - Keep the in-memory snapshot consistent with the document store.
//! - Track the single task being edited.
//! - Bundle both with the stores into one session-scoped controller that
//!   the view receives as context.

pub mod edit_session;
pub mod session;
pub mod sync_controller;
