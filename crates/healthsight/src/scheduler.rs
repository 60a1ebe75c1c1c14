//! The expiry scheduler: one timer, rearmed on every state change.
//!
//! The scheduler watches the session store and keeps exactly one
//! deadline: the instant the current token lapses. Every store change
//! cancels whatever was pending and re-evaluates from scratch, so
//! timers are rearmed, never stacked.
//!
//! # State machine
//!
//! ```text
//!   Idle ──(token + future expiry)──→ Armed ──(deadline passes)──→ Fired
//!    ↑                                  │
//!    └────────(any store change cancels and re-evaluates)──────────┘
//! ```
//!
//! - **Idle**: no token or no expiry; nothing to schedule.
//! - **Armed**: a deadline is pending for a future instant.
//! - **Fired**: forced logout ran. The `ClearCredentials` it dispatches
//!   wakes the loop again, which lands back in Idle.
//!
//! # Integration
//!
//! The scheduler sits inside the provider's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(()) = wake_rx.recv() => { scheduler.reevaluate(); }
//!         _ = scheduler.wait_for_expiry() => { scheduler.fire(); }
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use healthsight_storage::{ClearOptions, CredentialVault, PersistOptions};
use healthsight_store::{SessionAction, SessionStore};
use healthsight_token::decode_expiry;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::Navigator;
use crate::clock::now_ms;

/// Outcome of a [`ExpiryScheduler::reevaluate`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// Nothing to schedule: no token, or no known expiry.
    Idle,
    /// A logout deadline is armed for a future instant.
    Armed,
    /// The expiry was already in the past; forced logout ran
    /// synchronously during the evaluation.
    Fired,
}

/// Watches a [`SessionStore`] and forces logout when the token lapses.
///
/// One scheduler per provider. Holds at most one pending deadline; a
/// rearm always replaces it. Dropping the scheduler drops the deadline
/// with it — there is no detached timer to leak.
pub struct ExpiryScheduler {
    store: Arc<SessionStore>,
    vault: Arc<CredentialVault>,
    navigator: Arc<dyn Navigator>,
    /// The single pending deadline. `None` is the Idle state.
    deadline: Option<Instant>,
}

impl ExpiryScheduler {
    pub fn new(
        store: Arc<SessionStore>,
        vault: Arc<CredentialVault>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            vault,
            navigator,
            deadline: None,
        }
    }

    /// Cancels any pending deadline and re-evaluates the session.
    ///
    /// Called on every store change. Synchronous by design: a lapsed
    /// expiry is handled right here, not on the next turn of the event
    /// loop.
    ///
    /// A session that has a token but no expiry gets self-healed first:
    /// the expiry is decoded out of the token, dispatched, and
    /// persisted, so the rest of the evaluation (and every later one)
    /// sees an authoritative `expires_at`.
    pub fn reevaluate(&mut self) -> SchedulerStatus {
        self.deadline = None;

        let state = self.store.state();
        if let (Some(token), None) = (&state.token, state.expires_at) {
            if let Some(expires_at) = decode_expiry(token) {
                debug!(expires_at, "expiry recovered from token");
                self.store
                    .dispatch(SessionAction::SetTokenExpiry(Some(expires_at)));
                self.vault.persist(
                    token,
                    &PersistOptions {
                        remember: state.remember,
                        expires_at: Some(expires_at),
                        user: state.user.clone(),
                    },
                );
            }
        }

        // Re-read: the self-heal above may have changed the state.
        let state = self.store.state();
        let (Some(_), Some(expires_at)) = (&state.token, state.expires_at) else {
            debug!("nothing to schedule");
            return SchedulerStatus::Idle;
        };

        let ttl = expires_at - now_ms();
        if ttl <= 0 {
            self.force_logout();
            return SchedulerStatus::Fired;
        }

        self.deadline = Some(Instant::now() + Duration::from_millis(ttl as u64));
        debug!(ttl_ms = ttl, "logout deadline armed");
        SchedulerStatus::Armed
    }

    /// Waits until the armed deadline. Pends forever when Idle, which
    /// is the correct behavior inside `tokio::select!` — the wake
    /// branch still runs.
    pub async fn wait_for_expiry(&mut self) {
        match self.deadline {
            Some(deadline) => time::sleep_until(deadline).await,
            None => {
                // This future never completes; select! handles the rest.
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    /// Runs forced logout after [`wait_for_expiry`](Self::wait_for_expiry)
    /// resolves.
    pub fn fire(&mut self) {
        self.deadline = None;
        self.force_logout();
    }

    /// The armed deadline, if any.
    pub fn armed_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Clears persisted credentials (keeping the remember choice — a
    /// lapsed token is not the user changing their mind), clears the
    /// store, and navigates to the login surface.
    fn force_logout(&self) {
        info!("session expired; forcing logout");
        self.vault.clear(&ClearOptions {
            preserve_remember: true,
        });
        self.store.dispatch(SessionAction::ClearCredentials);
        self.navigator.to_login();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use healthsight_store::SessionState;

    use super::*;

    /// Counts navigation calls so tests can assert on forced logout.
    #[derive(Default)]
    struct RecordingNavigator {
        calls: AtomicUsize,
    }

    impl Navigator for RecordingNavigator {
        fn to_login(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn token_expiring_at(epoch_secs: i64) -> String {
        use base64::Engine;
        let payload = format!(r#"{{"exp":{epoch_secs}}}"#);
        let body = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());
        format!("h.{body}.s")
    }

    struct Harness {
        store: Arc<SessionStore>,
        vault: Arc<CredentialVault>,
        navigator: Arc<RecordingNavigator>,
        scheduler: ExpiryScheduler,
    }

    fn harness_with(state: SessionState) -> Harness {
        let store = Arc::new(SessionStore::with_state(state));
        let vault = Arc::new(CredentialVault::in_memory());
        let navigator = Arc::new(RecordingNavigator::default());
        let scheduler =
            ExpiryScheduler::new(store.clone(), vault.clone(), navigator.clone());
        Harness {
            store,
            vault,
            navigator,
            scheduler,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reevaluate_unauthenticated_stays_idle() {
        let mut h = harness_with(SessionState::default());

        let status = h.scheduler.reevaluate();

        assert_eq!(status, SchedulerStatus::Idle);
        assert_eq!(h.scheduler.armed_deadline(), None);
        assert_eq!(h.navigator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reevaluate_token_without_expiry_self_heals() {
        let token = token_expiring_at(9_999_999_999);
        let mut h = harness_with(SessionState {
            token: Some(token),
            ..SessionState::default()
        });

        let status = h.scheduler.reevaluate();

        assert_eq!(status, SchedulerStatus::Armed);
        assert_eq!(h.store.state().expires_at, Some(9_999_999_999_000));
        assert_eq!(h.vault.load_expiry(), Some(9_999_999_999_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reevaluate_undecodable_token_stays_idle() {
        let mut h = harness_with(SessionState {
            token: Some("opaque-token-without-exp".into()),
            ..SessionState::default()
        });

        let status = h.scheduler.reevaluate();

        assert_eq!(status, SchedulerStatus::Idle);
        assert_eq!(h.navigator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reevaluate_future_expiry_arms_deadline() {
        let mut h = harness_with(SessionState {
            token: Some("tok".into()),
            expires_at: Some(now_ms() + 60_000),
            ..SessionState::default()
        });

        let status = h.scheduler.reevaluate();

        assert_eq!(status, SchedulerStatus::Armed);
        assert!(h.scheduler.armed_deadline().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reevaluate_past_expiry_forces_logout_synchronously() {
        let mut h = harness_with(SessionState {
            token: Some("tok".into()),
            user: None,
            remember: true,
            expires_at: Some(now_ms() - 1),
        });
        h.vault.persist(
            "tok",
            &PersistOptions {
                remember: true,
                ..PersistOptions::default()
            },
        );

        let status = h.scheduler.reevaluate();

        assert_eq!(status, SchedulerStatus::Fired);
        assert_eq!(h.scheduler.armed_deadline(), None, "no timer armed");
        assert_eq!(h.navigator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.store.state().token, None);
        assert_eq!(h.vault.load_token(), None);
        assert!(h.vault.load_remember(), "forced logout keeps remember");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reevaluate_rearm_replaces_deadline() {
        // Three logins in a row: exactly one deadline remains, matching
        // the last state.
        let mut h = harness_with(SessionState::default());

        let mut deadlines = Vec::new();
        for minutes in [1, 2, 3] {
            h.store.dispatch(SessionAction::SetCredentials {
                token: Some(format!("tok-{minutes}")),
                user: None,
                remember: None,
                expires_at: Some(Some(now_ms() + minutes * 60_000)),
            });
            h.scheduler.reevaluate();
            deadlines.push(h.scheduler.armed_deadline().expect("armed"));
        }

        assert!(deadlines[0] < deadlines[1] && deadlines[1] < deadlines[2]);
        assert_eq!(h.scheduler.armed_deadline(), Some(deadlines[2]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reevaluate_after_logout_cancels_deadline() {
        let mut h = harness_with(SessionState {
            token: Some("tok".into()),
            expires_at: Some(now_ms() + 60_000),
            ..SessionState::default()
        });
        h.scheduler.reevaluate();
        assert!(h.scheduler.armed_deadline().is_some());

        h.store.dispatch(SessionAction::ClearCredentials);
        let status = h.scheduler.reevaluate();

        assert_eq!(status, SchedulerStatus::Idle);
        assert_eq!(h.scheduler.armed_deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_expiry_resolves_at_deadline() {
        let mut h = harness_with(SessionState {
            token: Some("tok".into()),
            expires_at: Some(now_ms() + 30_000),
            ..SessionState::default()
        });
        h.scheduler.reevaluate();

        // Paused clock: the sleep resolves once time auto-advances.
        h.scheduler.wait_for_expiry().await;
        h.scheduler.fire();

        assert_eq!(h.navigator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.store.state().token, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_expiry_idle_pends_forever() {
        let mut h = harness_with(SessionState::default());
        h.scheduler.reevaluate();

        let result =
            time::timeout(Duration::from_secs(3600), h.scheduler.wait_for_expiry()).await;

        assert!(result.is_err(), "idle scheduler must pend forever");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_then_reevaluate_returns_to_idle() {
        let mut h = harness_with(SessionState {
            token: Some("tok".into()),
            expires_at: Some(now_ms() + 10_000),
            ..SessionState::default()
        });
        h.scheduler.reevaluate();

        h.scheduler.wait_for_expiry().await;
        h.scheduler.fire();

        // The ClearCredentials dispatched by the forced logout would
        // wake the provider loop; the follow-up pass settles in Idle.
        assert_eq!(h.scheduler.reevaluate(), SchedulerStatus::Idle);
        assert_eq!(h.navigator.calls.load(Ordering::SeqCst), 1);
    }
}
