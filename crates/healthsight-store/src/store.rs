//! The session store: synchronous dispatch with ordered notification.
//!
//! # Concurrency note
//!
//! The store is `Send + Sync` (interior mutability behind mutexes) so it
//! can be shared between UI code and the scheduler task, but dispatch is
//! strictly synchronous: the state is updated, then every listener runs
//! on the dispatching thread, in subscription order, before `dispatch`
//! returns. Listeners read the new state via [`SessionStore::state`] —
//! the action payload is not handed to them.
//!
//! There is no hidden global. The hosting application constructs one
//! store and passes it around; tests construct as many as they like and
//! none of them interfere.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::{SessionAction, SessionState};

type Listener = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// Handle returned by [`SessionStore::subscribe`], used to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// The single state container for a running HealthSight client.
pub struct SessionStore {
    state: Mutex<SessionState>,
    /// Listeners in subscription order. Notification clones the `Arc`s
    /// out of the lock first, so a listener may subscribe/unsubscribe
    /// without deadlocking.
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

impl SessionStore {
    /// Creates an empty (unauthenticated) store.
    pub fn new() -> Self {
        Self::with_state(SessionState::default())
    }

    /// Creates a store preloaded with state, e.g. a token seeded from a
    /// server-rendered cookie before any client code has run.
    pub fn with_state(state: SessionState) -> Self {
        Self {
            state: Mutex::new(state),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.lock().expect("session state lock poisoned").clone()
    }

    /// Applies an action, then notifies all listeners synchronously in
    /// subscription order. Listeners observe the post-action state.
    pub fn dispatch(&self, action: SessionAction) {
        debug!(action = action.kind(), "dispatch");

        let snapshot = {
            let mut state = self.state.lock().expect("session state lock poisoned");
            reduce(&mut state, action);
            state.clone()
        };

        // State lock is released before listeners run so they can call
        // `state()` (or dispatch again) without deadlocking.
        let listeners: Vec<Listener> = {
            let guard = self.listeners.lock().expect("listener lock poisoned");
            guard.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// Registers a listener called after every dispatch.
    pub fn subscribe(
        &self,
        listener: impl Fn(&SessionState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .push((id, Arc::new(listener)));
        SubscriptionId(id)
    }

    /// Detaches a listener. Unknown ids are a no-op (double-unsubscribe
    /// is harmless).
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .retain(|(entry_id, _)| *entry_id != id.0);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The reducer: one action in, state mutated in place.
fn reduce(state: &mut SessionState, action: SessionAction) {
    match action {
        SessionAction::SetCredentials {
            token,
            user,
            remember,
            expires_at,
        } => {
            state.token = token;
            state.user = user;
            // Partial update: only apply what the caller provided.
            if let Some(remember) = remember {
                state.remember = remember;
            }
            if let Some(expires_at) = expires_at {
                state.expires_at = expires_at;
            }
        }
        SessionAction::ClearCredentials => {
            state.token = None;
            state.user = None;
            state.expires_at = None;
            // `remember` survives logout on purpose.
        }
        SessionAction::SetRemember(remember) => {
            state.remember = remember;
        }
        SessionAction::SetTokenExpiry(expires_at) => {
            state.expires_at = expires_at;
        }
    }
}
