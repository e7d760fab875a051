use std::sync::Arc;
use tudu_core::{
    AuthGate, CollectionPath, EditState, InputBuffers, LocalAuthGate, MemoryDocumentStore,
    NewTask, Priority, SessionError, StoreOp, TaskStore, TodoSession, User,
};

struct Fixture {
    gate: LocalAuthGate,
    backend: MemoryDocumentStore,
    session: TodoSession,
}

async fn signed_in() -> Fixture {
    let gate = LocalAuthGate::new();
    let backend = MemoryDocumentStore::new();
    let mut session = TodoSession::new(Arc::new(gate.clone()), Arc::new(backend.clone()));
    gate.sign_in(User::new("u1", "u1@example.com"));
    session.sync_session().await;
    Fixture {
        gate,
        backend,
        session,
    }
}

#[tokio::test]
async fn groceries_scenario_creates_low_priority_task() {
    let mut fx = signed_in().await;

    fx.session.inputs_mut().new_list_name = "Groceries".to_string();
    let list_id = fx.session.submit_new_list().await.unwrap();
    assert!(fx.session.inputs().new_list_name.is_empty());

    fx.session.inputs_mut().task_input_mut(&list_id).title = "Buy milk".to_string();
    let task_id = fx.session.submit_task_input(&list_id).await.unwrap();

    let snapshot = fx.session.snapshot();
    let list = snapshot.find_list(&list_id).unwrap();
    assert_eq!(list.list.name, "Groceries");
    let task = snapshot.find_task(&list_id, &task_id).unwrap();
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.priority, Priority::Low);
    assert_eq!(task.description, "");
    assert_eq!(
        fx.session.inputs().task_inputs.get(&list_id),
        Some(&NewTask::default())
    );
}

#[tokio::test]
async fn rejected_input_is_left_for_correction() {
    let mut fx = signed_in().await;
    fx.session.inputs_mut().new_list_name = "   ".to_string();
    let calls = fx.backend.call_count();

    let err = fx.session.submit_new_list().await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(fx.session.inputs().new_list_name, "   ");
    assert_eq!(fx.backend.call_count(), calls);
    assert!(fx.session.snapshot().is_empty());
}

#[tokio::test]
async fn mutations_without_user_are_skipped() {
    let mut fx = signed_in().await;
    let list_id = fx.session.create_list("Inbox").await.unwrap();
    let task_id = fx
        .session
        .create_task(&list_id, NewTask::titled("Keep"))
        .await
        .unwrap();
    fx.session.begin_edit(&list_id, &task_id).unwrap();
    fx.session.edit_draft_mut().unwrap().title = "Changed".to_string();
    let before = fx.session.snapshot().clone();

    // Drop the session on the gate without letting the controller see it.
    fx.gate.sign_out();
    let calls = fx.backend.call_count();

    assert!(matches!(
        fx.session.create_list("Other").await,
        Err(SessionError::AuthRequired)
    ));
    assert!(matches!(
        fx.session.create_task(&list_id, NewTask::titled("x")).await,
        Err(SessionError::AuthRequired)
    ));
    assert!(matches!(
        fx.session.delete_task(&list_id, &task_id).await,
        Err(SessionError::AuthRequired)
    ));
    assert!(matches!(
        fx.session.save_edit().await,
        Err(SessionError::AuthRequired)
    ));
    assert!(matches!(
        fx.session.reconcile().await,
        Err(SessionError::AuthRequired)
    ));
    assert!(matches!(
        fx.session.delete_list(&list_id).await,
        Err(SessionError::AuthRequired)
    ));
    assert!(matches!(
        fx.session.refresh().await,
        Err(SessionError::AuthRequired)
    ));
    assert_eq!(fx.backend.call_count(), calls);
    assert_eq!(fx.session.snapshot(), &before);
}

#[tokio::test]
async fn session_end_clears_snapshot_and_restart_reloads() {
    let mut fx = signed_in().await;
    fx.session.create_list("Inbox").await.unwrap();
    assert_eq!(fx.session.snapshot().list_count(), 1);

    fx.session.sign_out().await;
    assert!(fx.session.snapshot().is_empty());
    assert!(fx.session.current_user().is_none());

    fx.gate.sign_in(User::new("u1", "u1@example.com"));
    assert_eq!(fx.session.sync_session().await, 1);
    assert_eq!(fx.session.snapshot().list_count(), 1);

    fx.gate.sign_in(User::new("u2", "u2@example.com"));
    fx.session.sync_session().await;
    assert!(fx.session.snapshot().is_empty());
}

#[tokio::test]
async fn switching_user_drops_previous_draft_and_inputs() {
    let mut fx = signed_in().await;
    let list_id = fx.session.create_list("Private").await.unwrap();
    let task_id = fx
        .session
        .create_task(&list_id, NewTask::titled("Mine"))
        .await
        .unwrap();
    fx.session.begin_edit(&list_id, &task_id).unwrap();
    fx.session.edit_draft_mut().unwrap().title = "secret".to_string();
    fx.session.inputs_mut().new_list_name = "u1 draft".to_string();
    fx.session.inputs_mut().task_input_mut(&list_id).title = "u1 task".to_string();

    fx.gate.sign_in(User::new("u2", "u2@example.com"));
    fx.session.sync_session().await;

    assert!(fx.session.snapshot().is_empty());
    assert!(!fx.session.edit_session().is_editing());
    assert_eq!(fx.session.inputs(), &InputBuffers::default());
    assert!(matches!(
        fx.session.save_edit().await,
        Err(SessionError::NotEditing)
    ));

    // Same user signing in again keeps work in progress.
    fx.session.inputs_mut().new_list_name = "u2 draft".to_string();
    fx.gate.sign_in(User::new("u2", "u2@example.com"));
    fx.session.sync_session().await;
    assert_eq!(fx.session.inputs().new_list_name, "u2 draft");
}

#[tokio::test]
async fn switching_edit_target_discards_unsaved_draft() {
    let mut fx = signed_in().await;
    let first = fx.session.create_list("First").await.unwrap();
    let second = fx.session.create_list("Second").await.unwrap();
    let a = fx
        .session
        .create_task(&first, NewTask::titled("Task A"))
        .await
        .unwrap();
    let b = fx
        .session
        .create_task(&second, NewTask::titled("Task B"))
        .await
        .unwrap();

    fx.session.begin_edit(&first, &a).unwrap();
    fx.session.edit_draft_mut().unwrap().title = "A changed".to_string();
    let calls = fx.backend.call_count();

    let discarded = fx.session.begin_edit(&second, &b).unwrap().unwrap();
    assert_eq!(discarded.task_id, a);
    assert_eq!(fx.backend.call_count(), calls);

    let b_fields = fx.session.snapshot().find_task(&second, &b).unwrap().fields();
    match fx.session.edit_session().state() {
        EditState::Editing(target) => {
            assert_eq!(target.list_id, second);
            assert_eq!(target.task_id, b);
            assert_eq!(target.draft, b_fields);
        }
        EditState::Idle => panic!("expected editing state"),
    }

    fx.session.refresh().await.unwrap();
    let stored_a = fx.session.snapshot().find_task(&first, &a).unwrap();
    assert_eq!(stored_a.title, "Task A");
}

#[tokio::test]
async fn save_edit_replaces_fields_and_returns_to_idle() {
    let mut fx = signed_in().await;
    let list_id = fx.session.create_list("Work").await.unwrap();
    let task_id = fx
        .session
        .create_task(&list_id, NewTask::titled("Draft"))
        .await
        .unwrap();

    fx.session.begin_edit(&list_id, &task_id).unwrap();
    {
        let draft = fx.session.edit_draft_mut().unwrap();
        draft.title = "Final".to_string();
        draft.priority = Priority::High;
        draft.due_date = tudu_core::parse_due_date("2026-10-31").unwrap();
    }
    let expected = fx.session.edit_session().target().unwrap().draft.clone();

    fx.session.save_edit().await.unwrap();
    assert_eq!(fx.session.edit_session().state(), &EditState::Idle);
    let task = fx.session.snapshot().find_task(&list_id, &task_id).unwrap();
    assert_eq!(task.fields(), expected);
}

#[tokio::test]
async fn failed_save_keeps_draft_and_cancel_skips_store() {
    let mut fx = signed_in().await;
    let list_id = fx.session.create_list("Work").await.unwrap();
    let task_id = fx
        .session
        .create_task(&list_id, NewTask::titled("Draft"))
        .await
        .unwrap();

    fx.session.begin_edit(&list_id, &task_id).unwrap();
    fx.session.edit_draft_mut().unwrap().title = "  ".to_string();
    assert!(fx.session.save_edit().await.unwrap_err().is_validation());
    assert!(fx.session.edit_session().is_editing_task(&list_id, &task_id));

    fx.session.edit_draft_mut().unwrap().title = "Retry".to_string();
    fx.backend.inject_fault(
        StoreOp::Update,
        CollectionPath::tasks("u1", &list_id).to_string(),
    );
    assert!(matches!(
        fx.session.save_edit().await,
        Err(SessionError::Repo(err)) if err.is_remote()
    ));
    assert_eq!(
        fx.session.edit_session().target().unwrap().draft.title,
        "Retry"
    );

    let calls = fx.backend.call_count();
    let cancelled = fx.session.cancel_edit().unwrap();
    assert_eq!(cancelled.draft.title, "Retry");
    assert_eq!(fx.backend.call_count(), calls);
    assert!(matches!(
        fx.session.save_edit().await,
        Err(SessionError::NotEditing)
    ));
}

#[tokio::test]
async fn failed_mutation_still_reloads_snapshot() {
    let mut fx = signed_in().await;
    let list_id = fx.session.create_list("Inbox").await.unwrap();

    // Written behind the session's back; only a reload can surface it.
    let owner = fx.session.current_user().unwrap();
    TaskStore::new(Arc::new(fx.backend.clone()))
        .create_task(&owner, &list_id, NewTask::titled("seen"))
        .await
        .unwrap();
    assert_eq!(fx.session.snapshot().task_count(), 0);
    let generation = fx.session.sync_controller().generation();

    fx.backend
        .inject_fault(StoreOp::Add, CollectionPath::todo_lists("u1").to_string());
    assert!(fx.session.create_list("Blocked").await.is_err());

    assert_eq!(fx.session.sync_controller().generation(), generation + 1);
    assert_eq!(fx.session.snapshot().list_count(), 1);
    assert_eq!(fx.session.snapshot().task_count(), 1);
}

#[tokio::test]
async fn delete_list_removes_it_and_ends_edit_inside_it() {
    let mut fx = signed_in().await;
    let list_id = fx.session.create_list("Gone").await.unwrap();
    let task_id = fx
        .session
        .create_task(&list_id, NewTask::titled("Inside"))
        .await
        .unwrap();
    fx.session.begin_edit(&list_id, &task_id).unwrap();

    fx.session.delete_list(&list_id).await.unwrap();
    assert!(fx.session.snapshot().find_list(&list_id).is_none());
    assert!(!fx.session.edit_session().is_editing());
    assert!(matches!(
        fx.session.begin_edit(&list_id, &task_id),
        Err(SessionError::TaskNotFound { .. })
    ));
}

#[test]
fn gate_reports_current_user() {
    let gate = LocalAuthGate::new();
    assert!(gate.current_user().is_none());
    gate.sign_in(User::new("u1", "u1@example.com"));
    assert_eq!(gate.current_user().unwrap().id, "u1");
}
