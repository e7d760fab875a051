//! Task model and editable field sets.
//!
//! # Responsibility
//! - Define the persisted task read model and its priority scale.
//! - Define the create input (`NewTask`) and the full editable set
//!   (`TaskFields`) used by updates and edit drafts.
//!
//! # Invariants
//! - `title` is never blank on any persisted task.
//! - An update always writes the complete `TaskFields` set; nothing is
//!   merged from the prior version.

use crate::model::todo_list::ListId;
use crate::model::validation::{validate_task_title, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-assigned task identifier, unique within its list.
pub type TaskId = String;

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Task priority. Unspecified priority means `Low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

/// Persisted task read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Owning list.
    pub list_id: ListId,
    pub title: String,
    /// May be empty.
    pub description: String,
    /// `None` when the user left the date empty.
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Task {
    /// Returns the editable field set currently stored on this task.
    pub fn fields(&self) -> TaskFields {
        TaskFields {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            priority: self.priority,
        }
    }
}

/// Create input for a task.
///
/// Mirrors the per-list "add task" form: every field except `title` may be
/// left empty, and `priority = None` resolves to `Priority::Low`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
}

impl NewTask {
    /// Creates an input with only a title set.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_task_title(&self.title)
    }

    /// Resolves defaults into the full field set that gets persisted.
    pub fn into_fields(self) -> TaskFields {
        TaskFields {
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            priority: self.priority.unwrap_or_default(),
        }
    }
}

/// Complete editable field set of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
}

impl TaskFields {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_task_title(&self.title)
    }
}

impl From<&Task> for TaskFields {
    fn from(task: &Task) -> Self {
        task.fields()
    }
}

/// Parses date-input text. Empty text means "no due date".
pub fn parse_due_date(value: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, DUE_DATE_FORMAT)
        .map(Some)
        .map_err(|_| ValidationError::InvalidDueDate(trimmed.to_string()))
}

/// Formats a due date the way date inputs expect it, `""` for none.
pub fn format_due_date(value: Option<NaiveDate>) -> String {
    value
        .map(|date| date.format(DUE_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Serde adapter storing `Option<NaiveDate>` as `"YYYY-MM-DD"` or `""`.
pub(crate) mod due_date_format {
    use super::{format_due_date, parse_due_date};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_due_date(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(text) => parse_due_date(&text).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{format_due_date, parse_due_date, NewTask, Priority};
    use crate::model::validation::ValidationError;
    use chrono::NaiveDate;

    #[test]
    fn missing_priority_resolves_to_low() {
        let fields = NewTask::titled("Buy milk").into_fields();
        assert_eq!(fields.priority, Priority::Low);
        assert_eq!(fields.description, "");
        assert_eq!(fields.due_date, None);
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!(" High ".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(
            "urgent".parse::<Priority>().unwrap_err(),
            ValidationError::UnknownPriority("urgent".to_string())
        );
    }

    #[test]
    fn due_date_text_roundtrips_through_input_format() {
        let date = parse_due_date("2026-11-02").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 11, 2));
        assert_eq!(format_due_date(date), "2026-11-02");
        assert_eq!(parse_due_date("  ").unwrap(), None);
        assert_eq!(format_due_date(None), "");
        assert!(matches!(
            parse_due_date("02/11/2026"),
            Err(ValidationError::InvalidDueDate(_))
        ));
    }
}
