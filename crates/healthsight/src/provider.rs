//! The session provider: owns the store, runs bootstrap once, and
//! drives the expiry scheduler for its lifetime.
//!
//! One provider per running application instance. Nothing here is a
//! process-wide singleton; tests spin up as many providers as they
//! like, each with its own store, vault, and scheduler task.

use std::sync::Arc;

use healthsight_storage::{ClearOptions, CredentialVault};
use healthsight_store::{SessionAction, SessionState, SessionStore, SubscriptionId, UserProfile};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::scheduler::ExpiryScheduler;
use crate::{Navigator, bootstrap};

/// Server-provided state available before any client code has run:
/// the server-rendering step read the auth cookies and hands over what
/// it found.
#[derive(Debug, Clone, Default)]
pub struct SessionSeed {
    /// Token from the server-visible cookie, if any.
    pub token: Option<String>,
    /// Profile from the server-visible user cookie, if any. Used as
    /// the lowest-precedence fallback during bootstrap.
    pub user: Option<UserProfile>,
}

/// How to clear state on an explicit logout.
#[derive(Debug, Clone)]
pub struct LogoutOptions {
    /// Keep the stored remember preference. Defaults to `true`: signing
    /// out is not the same as unchecking "keep me signed in".
    pub preserve_remember: bool,
}

impl Default for LogoutOptions {
    fn default() -> Self {
        Self {
            preserve_remember: true,
        }
    }
}

/// Owns the session subsystem for one application instance.
///
/// Construction bootstraps the store from the seed and the vault, then
/// spawns the scheduler loop. [`shutdown`](Self::shutdown) detaches the
/// store listener and aborts the loop; no timer survives the provider.
pub struct SessionProvider {
    store: Arc<SessionStore>,
    vault: Arc<CredentialVault>,
    navigator: Arc<dyn Navigator>,
    wake_subscription: SubscriptionId,
    scheduler_task: JoinHandle<()>,
}

impl SessionProvider {
    /// Builds the store (seeded if the server provided a token), runs
    /// the bootstrap reconciliation once, and starts the scheduler.
    ///
    /// Must be called from within a Tokio runtime — the scheduler loop
    /// is spawned onto it.
    pub fn start(
        vault: Arc<CredentialVault>,
        navigator: Arc<dyn Navigator>,
        seed: Option<SessionSeed>,
    ) -> Self {
        let seed = seed.unwrap_or_default();

        let store = Arc::new(match &seed.token {
            Some(token) => SessionStore::with_state(SessionState {
                token: Some(token.clone()),
                ..SessionState::default()
            }),
            None => SessionStore::new(),
        });

        bootstrap(&store, &vault, seed.user.as_ref());

        // Every dispatch pokes the scheduler loop through this channel.
        // Unbounded is fine: wakes are coalesced by the loop reading one
        // at a time and re-reading fresh state each pass.
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();
        let wake_subscription = store.subscribe(move |_| {
            let _ = wake_tx.send(());
        });

        let scheduler = ExpiryScheduler::new(store.clone(), vault.clone(), navigator.clone());
        let scheduler_task = tokio::spawn(run_scheduler(scheduler, wake_rx));

        info!("session provider started");
        Self {
            store,
            vault,
            navigator,
            wake_subscription,
            scheduler_task,
        }
    }

    /// The store. Pages dispatch, snapshot, and subscribe through this.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// The vault, for callers applying a login response.
    pub fn vault(&self) -> &Arc<CredentialVault> {
        &self.vault
    }

    /// Explicit logout: clear storage (keeping the remember choice),
    /// clear credentials, go to the login surface.
    pub fn logout(&self) {
        self.logout_with(LogoutOptions::default());
    }

    /// Logout with control over the remember preference, for callers
    /// that treat signing out as "forget me entirely".
    pub fn logout_with(&self, opts: LogoutOptions) {
        info!(preserve_remember = opts.preserve_remember, "logout");
        self.vault.clear(&ClearOptions {
            preserve_remember: opts.preserve_remember,
        });
        self.store.dispatch(SessionAction::ClearCredentials);
        self.navigator.to_login();
    }

    /// Tears the provider down: detaches the store listener and aborts
    /// the scheduler loop, cancelling any pending logout deadline.
    pub fn shutdown(self) {
        self.store.unsubscribe(self.wake_subscription);
        self.scheduler_task.abort();
        debug!("session provider shut down");
    }
}

/// The scheduler loop: re-evaluate on every store change, force logout
/// when the armed deadline passes.
async fn run_scheduler(mut scheduler: ExpiryScheduler, mut wake_rx: mpsc::UnboundedReceiver<()>) {
    // Cover everything dispatched during bootstrap, before the loop
    // had a chance to listen.
    scheduler.reevaluate();

    loop {
        tokio::select! {
            wake = wake_rx.recv() => {
                match wake {
                    Some(()) => {
                        scheduler.reevaluate();
                    }
                    // Listener detached: the provider shut down.
                    None => break,
                }
            }
            _ = scheduler.wait_for_expiry() => {
                scheduler.fire();
            }
        }
    }

    debug!("scheduler loop ended");
}
