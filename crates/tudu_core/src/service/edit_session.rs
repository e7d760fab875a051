//! Single-slot edit state machine.
//!
//! # Invariants
//! - At most one task is in edit mode, across all lists.
//! - Beginning an edit on another task discards the current draft unsaved.
//! - Cancel never touches the store.

use crate::model::task::{Task, TaskFields, TaskId};
use crate::model::todo_list::ListId;

/// Task under edit together with its draft buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    pub list_id: ListId,
    pub task_id: TaskId,
    pub draft: TaskFields,
}

/// Edit slot state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing(EditTarget),
}

/// Session-owned edit slot.
#[derive(Debug, Default)]
pub struct EditSession {
    state: EditState,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing(_))
    }

    /// Whether `task_id` of `list_id` is the task in edit mode.
    pub fn is_editing_task(&self, list_id: &str, task_id: &str) -> bool {
        self.target()
            .is_some_and(|target| target.list_id == list_id && target.task_id == task_id)
    }

    pub fn target(&self) -> Option<&EditTarget> {
        match &self.state {
            EditState::Editing(target) => Some(target),
            EditState::Idle => None,
        }
    }

    /// Mutable draft of the task in edit mode.
    pub fn draft_mut(&mut self) -> Option<&mut TaskFields> {
        match &mut self.state {
            EditState::Editing(target) => Some(&mut target.draft),
            EditState::Idle => None,
        }
    }

    /// `Idle -> Editing` or `Editing -> Editing`.
    ///
    /// Seeds the draft from `task`'s stored fields. Returns the previous
    /// target when one was discarded by the switch.
    pub fn begin(&mut self, task: &Task) -> Option<EditTarget> {
        let next = EditState::Editing(EditTarget {
            list_id: task.list_id.clone(),
            task_id: task.id.clone(),
            draft: task.fields(),
        });
        match std::mem::replace(&mut self.state, next) {
            EditState::Editing(previous) => Some(previous),
            EditState::Idle => None,
        }
    }

    /// `Editing -> Idle` discarding the draft. Returns the discarded target.
    pub fn cancel(&mut self) -> Option<EditTarget> {
        match std::mem::take(&mut self.state) {
            EditState::Editing(target) => Some(target),
            EditState::Idle => None,
        }
    }

    /// `Editing -> Idle` after a successful save of `task_id`.
    ///
    /// Leaves the slot alone if it has since moved to another task.
    pub fn complete(&mut self, list_id: &str, task_id: &str) -> bool {
        if self.is_editing_task(list_id, task_id) {
            self.state = EditState::Idle;
            return true;
        }
        false
    }
}
