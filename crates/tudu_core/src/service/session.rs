//! Session-scoped controller handed to the view.
//!
//! # Responsibility
//! - Resolve the current user for every mutation and skip it when signed out.
//! - Route view gestures to the list/task stores and settle each through
//!   `SyncController`.
//! - Own the edit slot and the per-list input buffers.
//!
//! # Invariants
//! - No remote call is made while no user is signed in.
//! - Input buffers are only cleared after a successful write; rejected or
//!   failed input stays in place for correction.
//! - Every remote failure is logged before it is returned; the view may
//!   ignore the returned error.
//! - The edit slot and input buffers never outlive the user who filled them.

use crate::auth::{AuthGate, SessionListener, Subscription};
use crate::model::snapshot::Snapshot;
use crate::model::task::{NewTask, TaskFields, TaskId};
use crate::model::todo_list::ListId;
use crate::model::user::{User, UserId};
use crate::model::validation::ValidationError;
use crate::repo::list_store::{ListStore, ReconcileReport};
use crate::repo::task_store::TaskStore;
use crate::repo::RepoError;
use crate::service::edit_session::{EditSession, EditTarget};
use crate::service::sync_controller::SyncController;
use crate::store::DocumentStore;
use log::{debug, info};
use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

pub type SessionResult<T> = Result<T, SessionError>;

/// Errors from session-level operations.
#[derive(Debug)]
pub enum SessionError {
    /// No authenticated user; the operation was skipped.
    AuthRequired,
    /// Edit requested for a task absent from the current snapshot.
    TaskNotFound { list_id: ListId, task_id: TaskId },
    /// Save requested while the edit slot is idle.
    NotEditing,
    /// Store-level failure.
    Repo(RepoError),
}

impl SessionError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Repo(RepoError::Validation(_)))
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthRequired => write!(f, "no authenticated user"),
            Self::TaskNotFound { list_id, task_id } => {
                write!(f, "task {task_id} not found in list {list_id}")
            }
            Self::NotEditing => write!(f, "no task is being edited"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ValidationError> for SessionError {
    fn from(value: ValidationError) -> Self {
        Self::Repo(RepoError::Validation(value))
    }
}

/// Form state the view binds its inputs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffers {
    /// "Create new list" input.
    pub new_list_name: String,
    /// Per-list "add task" forms.
    pub task_inputs: HashMap<ListId, NewTask>,
}

impl InputBuffers {
    /// Add-task form of `list_id`, created empty on first access.
    pub fn task_input_mut(&mut self, list_id: &str) -> &mut NewTask {
        self.task_inputs.entry(list_id.to_string()).or_default()
    }
}

type SessionEvents = Arc<Mutex<VecDeque<Option<User>>>>;

/// Session-scoped controller: stores, snapshot, edit slot and inputs.
pub struct TodoSession {
    auth: Arc<dyn AuthGate>,
    lists: ListStore,
    tasks: TaskStore,
    sync: SyncController,
    edit: EditSession,
    inputs: InputBuffers,
    principal: Option<UserId>,
    pending: SessionEvents,
    _subscription: Subscription,
}

impl TodoSession {
    /// Creates a session bound to `auth` and subscribes to its changes.
    ///
    /// Session changes are queued by the subscription and applied by
    /// `sync_session`, which the view drives from its event loop.
    pub fn new(auth: Arc<dyn AuthGate>, store: Arc<dyn DocumentStore>) -> Self {
        let pending: SessionEvents = Arc::default();
        let sink = Arc::clone(&pending);
        let listener: SessionListener = Arc::new(move |user: Option<&User>| {
            if let Ok(mut queue) = sink.lock() {
                queue.push_back(user.cloned());
            }
        });
        let subscription = auth.subscribe(listener);

        Self {
            auth,
            lists: ListStore::new(Arc::clone(&store)),
            tasks: TaskStore::new(Arc::clone(&store)),
            sync: SyncController::new(store),
            edit: EditSession::new(),
            inputs: InputBuffers::default(),
            principal: None,
            pending,
            _subscription: subscription,
        }
    }

    /// Applies queued session changes in order.
    ///
    /// Any change of principal (sign-out or another user signing in) ends
    /// the edit and resets the input buffers before the snapshot follows.
    ///
    /// Returns the number of changes applied. Reload failures are logged
    /// and leave the previous snapshot in place.
    pub async fn sync_session(&mut self) -> usize {
        let events: Vec<Option<User>> = match self.pending.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for user in &events {
            let next = user.as_ref().map(|user| user.id.clone());
            if next != self.principal {
                let discarded = self.edit.cancel();
                self.inputs = InputBuffers::default();
                info!(
                    "event=session_switch module=session status=ok signed_in={} edit_discarded={}",
                    next.is_some(),
                    discarded.is_some()
                );
                self.principal = next;
            }
            if let Err(err) = self.sync.on_session_change(user.as_ref()).await {
                debug!("event=session_switch module=session status=stale error={err}");
            }
        }
        events.len()
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.sync.snapshot()
    }

    pub fn sync_controller(&self) -> &SyncController {
        &self.sync
    }

    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    pub fn inputs(&self) -> &InputBuffers {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut InputBuffers {
        &mut self.inputs
    }

    pub fn current_user(&self) -> Option<User> {
        self.auth.current_user()
    }

    /// Reloads the snapshot for the signed-in user.
    pub async fn refresh(&mut self) -> SessionResult<()> {
        let user = self.require_user("refresh")?;
        self.sync.reload(&user).await.map_err(Into::into)
    }

    /// Creates a list named `name`.
    pub async fn create_list(&mut self, name: &str) -> SessionResult<ListId> {
        let user = self.require_user("list_create")?;
        let outcome = self.lists.create_list(&user, name).await;
        Ok(self.sync.settle(&user, "list_create", outcome).await?)
    }

    /// Creates a list from the new-list input, clearing it on success.
    pub async fn submit_new_list(&mut self) -> SessionResult<ListId> {
        let name = self.inputs.new_list_name.clone();
        let list_id = self.create_list(&name).await?;
        self.inputs.new_list_name.clear();
        Ok(list_id)
    }

    /// Deletes a list and its tasks.
    pub async fn delete_list(&mut self, list_id: &ListId) -> SessionResult<()> {
        let user = self.require_user("list_delete")?;
        let outcome = self.lists.delete_list(&user, list_id).await;
        let outcome = self.sync.settle(&user, "list_delete", outcome).await;
        if outcome.is_ok() {
            self.inputs.task_inputs.remove(list_id);
            if self
                .edit
                .target()
                .is_some_and(|target| &target.list_id == list_id)
            {
                self.edit.cancel();
            }
        }
        Ok(outcome?)
    }

    /// Creates a task in `list_id`.
    pub async fn create_task(&mut self, list_id: &ListId, input: NewTask) -> SessionResult<TaskId> {
        let user = self.require_user("task_create")?;
        let outcome = self.tasks.create_task(&user, list_id, input).await;
        Ok(self.sync.settle(&user, "task_create", outcome).await?)
    }

    /// Creates a task from the list's add-task form, resetting it on success.
    pub async fn submit_task_input(&mut self, list_id: &ListId) -> SessionResult<TaskId> {
        let input = self
            .inputs
            .task_inputs
            .get(list_id)
            .cloned()
            .unwrap_or_default();
        let task_id = self.create_task(list_id, input).await?;
        self.inputs
            .task_inputs
            .insert(list_id.clone(), NewTask::default());
        Ok(task_id)
    }

    /// Deletes one task.
    pub async fn delete_task(&mut self, list_id: &ListId, task_id: &TaskId) -> SessionResult<()> {
        let user = self.require_user("task_delete")?;
        let outcome = self.tasks.delete_task(&user, list_id, task_id).await;
        let outcome = self.sync.settle(&user, "task_delete", outcome).await;
        if outcome.is_ok() {
            self.edit.complete(list_id, task_id);
        }
        Ok(outcome?)
    }

    /// Puts a task from the current snapshot in edit mode.
    ///
    /// Returns the target whose unsaved draft was discarded, if any.
    pub fn begin_edit(
        &mut self,
        list_id: &ListId,
        task_id: &TaskId,
    ) -> SessionResult<Option<EditTarget>> {
        let task = self
            .sync
            .snapshot()
            .find_task(list_id, task_id)
            .ok_or_else(|| SessionError::TaskNotFound {
                list_id: list_id.clone(),
                task_id: task_id.clone(),
            })?;
        let discarded = self.edit.begin(task);
        if let Some(previous) = &discarded {
            debug!(
                "event=edit_switch module=session status=ok discarded_task_id={} task_id={task_id}",
                previous.task_id
            );
        }
        Ok(discarded)
    }

    /// Mutable draft of the task in edit mode.
    pub fn edit_draft_mut(&mut self) -> Option<&mut TaskFields> {
        self.edit.draft_mut()
    }

    /// Writes the draft as a full replace, then leaves edit mode.
    ///
    /// On rejection or failure the slot stays in edit mode with the draft.
    pub async fn save_edit(&mut self) -> SessionResult<()> {
        let user = self.require_user("task_update")?;
        let target = self.edit.target().cloned().ok_or(SessionError::NotEditing)?;
        let outcome = self
            .tasks
            .update_task(&user, &target.list_id, &target.task_id, &target.draft)
            .await;
        self.sync.settle(&user, "task_update", outcome).await?;
        self.edit.complete(&target.list_id, &target.task_id);
        Ok(())
    }

    /// Leaves edit mode without saving.
    pub fn cancel_edit(&mut self) -> Option<EditTarget> {
        self.edit.cancel()
    }

    /// Finishes incomplete cascade deletes, then reloads.
    pub async fn reconcile(&mut self) -> SessionResult<ReconcileReport> {
        let user = self.require_user("list_reconcile")?;
        let outcome = self.lists.reconcile(&user).await;
        Ok(self.sync.settle(&user, "list_reconcile", outcome).await?)
    }

    /// Ends the session through the auth gate and applies the change.
    pub async fn sign_out(&mut self) {
        self.auth.sign_out();
        self.sync_session().await;
    }

    fn require_user(&self, action: &'static str) -> SessionResult<User> {
        self.auth.current_user().ok_or_else(|| {
            info!("event={action} module=session status=skipped reason=auth_required");
            SessionError::AuthRequired
        })
    }
}
