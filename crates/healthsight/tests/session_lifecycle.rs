//! End-to-end tests for the session lifecycle: bootstrap, login,
//! scheduled forced logout, explicit logout, teardown.
//!
//! Uses `tokio::time::pause()` (via `start_paused`) so logout deadlines
//! resolve deterministically: the clock auto-advances to the armed
//! deadline once every task is idle, without real waiting.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use tokio::sync::Notify;

use healthsight::{
    LoginResponse, LogoutOptions, Navigator, SessionAction, SessionProvider, SessionSeed,
    apply_login,
};
use healthsight_storage::{ClearOptions, CredentialVault, PersistOptions};
use healthsight_store::UserProfile;

// =========================================================================
// Helpers
// =========================================================================

/// Records navigation calls and wakes anyone awaiting a forced logout.
#[derive(Default)]
struct RecordingNavigator {
    calls: AtomicUsize,
    notify: Notify,
}

impl RecordingNavigator {
    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn to_login(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_one();
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after 1970")
        .as_millis() as i64
}

/// An unsigned compact token whose payload carries the given `exp`
/// (seconds since epoch).
fn token_expiring_at(epoch_secs: i64) -> String {
    let payload = format!(r#"{{"exp":{epoch_secs}}}"#);
    let body = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());
    format!("eyJhbGciOiJIUzI1NiJ9.{body}.sig")
}

fn profile(name: &str) -> UserProfile {
    UserProfile {
        full_name: Some(name.to_string()),
        ..UserProfile::default()
    }
}

struct World {
    vault: Arc<CredentialVault>,
    navigator: Arc<RecordingNavigator>,
}

impl World {
    fn new() -> Self {
        Self {
            vault: Arc::new(CredentialVault::in_memory()),
            navigator: Arc::new(RecordingNavigator::default()),
        }
    }

    fn start(&self, seed: Option<SessionSeed>) -> SessionProvider {
        SessionProvider::start(self.vault.clone(), self.navigator.clone(), seed)
    }
}

/// Lets the scheduler loop drain its wake channel.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

// =========================================================================
// Bootstrap through the provider
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_with_stored_token_computes_expiry_from_payload() {
    // No stored expiry anywhere; the bootstrap decodes it from the
    // token and the scheduler arms a timer for it.
    let world = World::new();
    let token = token_expiring_at(9_999_999_999);
    world.vault.persist(&token, &PersistOptions::default());

    let provider = world.start(None);
    settle().await;

    let state = provider.store().state();
    assert_eq!(state.token.as_deref(), Some(&token[..]));
    assert_eq!(state.expires_at, Some(9_999_999_999_000));
    assert_eq!(world.navigator.count(), 0, "far-future expiry: no logout");

    provider.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_start_unauthenticated_stays_quiet() {
    let world = World::new();
    let provider = world.start(None);
    settle().await;

    assert_eq!(provider.store().state().token, None);
    assert_eq!(world.navigator.count(), 0);

    provider.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_start_with_server_seed_hydrates_and_repairs_storage() {
    let world = World::new();
    let provider = world.start(Some(SessionSeed {
        token: Some("seeded-tok".to_string()),
        user: Some(profile("Ada")),
    }));
    settle().await;

    let state = provider.store().state();
    assert_eq!(state.token.as_deref(), Some("seeded-tok"));
    assert_eq!(state.user, Some(profile("Ada")));
    // Bootstrap re-persisted the reconciled state into the tiers.
    assert_eq!(world.vault.load_token().as_deref(), Some("seeded-tok"));

    provider.shutdown();
}

// =========================================================================
// Scheduled forced logout
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_expiry_fires_forced_logout() {
    let world = World::new();
    let token = token_expiring_at(now_ms() / 1_000 + 60);
    world.vault.persist(
        &token,
        &PersistOptions {
            remember: true,
            expires_at: Some(now_ms() + 60_000),
            ..PersistOptions::default()
        },
    );

    let provider = world.start(None);
    assert!(provider.store().state().is_authenticated());

    // The paused clock auto-advances to the armed deadline.
    world.navigator.notify.notified().await;
    settle().await;

    assert_eq!(world.navigator.count(), 1);
    assert_eq!(provider.store().state().token, None);
    assert_eq!(world.vault.load_token(), None);
    assert!(
        world.vault.load_remember(),
        "forced logout preserves the remember choice"
    );

    provider.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_already_lapsed_session_logs_out_at_startup() {
    let world = World::new();
    world.vault.persist(
        "stale-tok",
        &PersistOptions {
            expires_at: Some(now_ms() - 1),
            ..PersistOptions::default()
        },
    );

    let provider = world.start(None);
    world.navigator.notify.notified().await;
    settle().await;

    assert_eq!(world.navigator.count(), 1);
    assert_eq!(provider.store().state().token, None);

    provider.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_rearms_replace_timer_and_fire_once() {
    // Three logins in quick succession: only the last deadline exists,
    // so exactly one forced logout happens.
    let world = World::new();
    let provider = world.start(None);
    settle().await;

    for minutes in [1, 2, 3] {
        provider.store().dispatch(SessionAction::SetCredentials {
            token: Some(format!("tok-{minutes}")),
            user: None,
            remember: None,
            expires_at: Some(Some(now_ms() + minutes * 60_000)),
        });
    }

    world.navigator.notify.notified().await;
    settle().await;

    assert_eq!(world.navigator.count(), 1, "one timer, one logout");
    assert_eq!(provider.store().state().token, None);

    provider.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_logout_cancels_pending_timer() {
    let world = World::new();
    let provider = world.start(None);
    settle().await;

    provider.store().dispatch(SessionAction::SetCredentials {
        token: Some("tok".to_string()),
        user: None,
        remember: None,
        expires_at: Some(Some(now_ms() + 60_000)),
    });
    settle().await;

    provider.logout();
    settle().await;
    assert_eq!(world.navigator.count(), 1, "explicit logout navigated");

    // Long after the old deadline the count is unchanged — the timer
    // was cancelled, not left to fire a second logout.
    tokio::time::sleep(Duration::from_secs(3600)).await;
    settle().await;
    assert_eq!(world.navigator.count(), 1);

    provider.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_timer_and_listener() {
    let world = World::new();
    let provider = world.start(None);
    settle().await;

    provider.store().dispatch(SessionAction::SetCredentials {
        token: Some("tok".to_string()),
        user: None,
        remember: None,
        expires_at: Some(Some(now_ms() + 60_000)),
    });
    settle().await;

    provider.shutdown();

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(world.navigator.count(), 0, "no timer survives shutdown");
}

// =========================================================================
// Login and logout
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_login_then_scheduled_logout() {
    let world = World::new();
    let provider = world.start(None);
    settle().await;

    let response = LoginResponse {
        access_token: "fresh-tok".to_string(),
        token_type: Some("Bearer".to_string()),
        expires_in: Some(120),
        user: Some(profile("Ada")),
    };
    apply_login(provider.store(), provider.vault(), response, true).expect("login applies");
    settle().await;

    let state = provider.store().state();
    assert_eq!(state.token.as_deref(), Some("fresh-tok"));
    assert!(state.remember);
    assert_eq!(state.user, Some(profile("Ada")));

    world.navigator.notify.notified().await;
    settle().await;

    assert_eq!(world.navigator.count(), 1);
    assert_eq!(provider.store().state().token, None);
    assert!(world.vault.load_remember());

    provider.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_remember_survives_explicit_logout_by_default() {
    let world = World::new();
    let provider = world.start(None);
    settle().await;

    apply_login(
        provider.store(),
        provider.vault(),
        LoginResponse {
            access_token: "tok".to_string(),
            token_type: None,
            expires_in: Some(3_600),
            user: None,
        },
        true,
    )
    .expect("login applies");

    provider.logout();
    settle().await;

    assert_eq!(provider.store().state().token, None);
    assert!(provider.store().state().remember, "in-memory flag survives");
    assert!(world.vault.load_remember(), "stored flag survives");
    assert_eq!(world.navigator.count(), 1);

    provider.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_logout_with_reset_drops_remember() {
    let world = World::new();
    let provider = world.start(None);
    settle().await;

    apply_login(
        provider.store(),
        provider.vault(),
        LoginResponse {
            access_token: "tok".to_string(),
            token_type: None,
            expires_in: Some(3_600),
            user: None,
        },
        true,
    )
    .expect("login applies");

    provider.logout_with(LogoutOptions {
        preserve_remember: false,
    });
    settle().await;

    assert!(!world.vault.load_remember(), "explicit reset drops the flag");

    provider.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_clear_without_preserve_resets_remember() {
    let world = World::new();
    world.vault.persist(
        "tok",
        &PersistOptions {
            remember: true,
            ..PersistOptions::default()
        },
    );
    assert!(world.vault.load_remember());

    world.vault.clear(&ClearOptions {
        preserve_remember: false,
    });

    assert!(!world.vault.load_remember());
}

// =========================================================================
// Full lifecycle
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_full_lifecycle_login_expire_restart() {
    // Login → token lapses → forced logout → a fresh provider finds a
    // clean slate except for the remembered preference.
    let world = World::new();

    let provider = world.start(None);
    settle().await;
    apply_login(
        provider.store(),
        provider.vault(),
        LoginResponse {
            access_token: token_expiring_at(now_ms() / 1_000 + 90),
            token_type: Some("Bearer".to_string()),
            expires_in: None, // expiry comes from the token payload
            user: Some(profile("Ada")),
        },
        true,
    )
    .expect("login applies");
    settle().await;

    world.navigator.notify.notified().await;
    settle().await;
    assert_eq!(world.navigator.count(), 1);
    provider.shutdown();

    // "Restart": a second provider over the same vault.
    let provider = world.start(None);
    settle().await;

    let state = provider.store().state();
    assert_eq!(state.token, None, "no credentials survive the lapse");
    assert_eq!(state.user, None);
    assert!(state.remember, "the remember choice survived");
    assert_eq!(world.navigator.count(), 1, "fresh provider does not navigate");

    provider.shutdown();
}
