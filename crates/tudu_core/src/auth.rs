//! Authentication gate consumed by the session controller.
//!
//! # Responsibility
//! - Expose the current principal and session-change notifications.
//! - Provide an in-process gate for the CLI and tests.
//!
//! # Invariants
//! - A new subscriber is notified immediately with the current state.
//! - Listeners are notified in subscription order, outside the gate's lock.
//! - A dropped `Subscription` never fires again.

use crate::model::user::User;
use log::info;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Callback invoked with the new session state (`None` = signed out).
pub type SessionListener = Arc<dyn Fn(Option<&User>) + Send + Sync>;

/// Contract of the external auth provider.
pub trait AuthGate: Send + Sync {
    /// Principal of the active session, if any.
    fn current_user(&self) -> Option<User>;
    /// Registers a session-change listener.
    fn subscribe(&self, listener: SessionListener) -> Subscription;
    /// Ends the active session.
    fn sign_out(&self);
}

/// Handle returned by `AuthGate::subscribe`. Unsubscribes on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription that has nothing to cancel.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

#[derive(Default)]
struct GateState {
    user: Option<User>,
    next_id: u64,
    listeners: BTreeMap<u64, SessionListener>,
}

/// In-process `AuthGate` with explicit sign-in.
#[derive(Clone, Default)]
pub struct LocalAuthGate {
    state: Arc<Mutex<GateState>>,
}

impl LocalAuthGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session for `user`, replacing any active one.
    pub fn sign_in(&self, user: User) {
        info!("event=session_start module=auth status=ok user_id={}", user.id);
        self.transition(Some(user));
    }

    pub fn listener_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.listeners.len())
            .unwrap_or(0)
    }

    fn transition(&self, user: Option<User>) {
        let listeners: Vec<SessionListener> = match self.state.lock() {
            Ok(mut state) => {
                state.user = user.clone();
                state.listeners.values().cloned().collect()
            }
            Err(_) => return,
        };
        for listener in listeners {
            listener(user.as_ref());
        }
    }
}

impl AuthGate for LocalAuthGate {
    fn current_user(&self) -> Option<User> {
        self.state.lock().ok().and_then(|state| state.user.clone())
    }

    fn subscribe(&self, listener: SessionListener) -> Subscription {
        let (id, current) = match self.state.lock() {
            Ok(mut state) => {
                let id = state.next_id;
                state.next_id += 1;
                state.listeners.insert(id, Arc::clone(&listener));
                (id, state.user.clone())
            }
            Err(_) => return Subscription::noop(),
        };
        listener(current.as_ref());

        let registry = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = registry.upgrade() {
                if let Ok(mut state) = state.lock() {
                    state.listeners.remove(&id);
                }
            }
        })
    }

    fn sign_out(&self) {
        if self.current_user().is_none() {
            return;
        }
        info!("event=session_end module=auth status=ok");
        self.transition(None);
    }
}
