//! Field validation errors for list/task writes.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input rejected before any remote call is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// List name is empty or whitespace only.
    EmptyListName,
    /// Task title is empty or whitespace only.
    EmptyTaskTitle,
    /// Priority text is not one of `low|medium|high`.
    UnknownPriority(String),
    /// Due date text is not `YYYY-MM-DD`.
    InvalidDueDate(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyListName => write!(f, "list name must not be blank"),
            Self::EmptyTaskTitle => write!(f, "task title must not be blank"),
            Self::UnknownPriority(value) => {
                write!(f, "unknown priority `{value}`; expected low|medium|high")
            }
            Self::InvalidDueDate(value) => {
                write!(f, "invalid due date `{value}`; expected YYYY-MM-DD")
            }
        }
    }
}

impl Error for ValidationError {}

/// Rejects blank list names. The name itself is stored unmodified.
pub fn validate_list_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyListName);
    }
    Ok(())
}

/// Rejects blank task titles. The title itself is stored unmodified.
pub fn validate_task_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTaskTitle);
    }
    Ok(())
}
