//! Startup reconciliation between server-seeded and client-persisted
//! session state.
//!
//! Two parties may know about a session before the app runs: the server
//! (it read the auth cookie while rendering and seeded the store) and
//! the client's own storage tiers from a previous visit. Neither side
//! is blindly trusted. Storage wins for the token (it is more current
//! than a possibly-stale server seed), storage wins over memory for the
//! expiry, and memory wins over recomputing from the token. The merge
//! runs exactly once per provider; running it again with unchanged
//! storage dispatches nothing.

use healthsight_storage::{CredentialVault, PersistOptions};
use healthsight_store::{SessionAction, SessionStore, UserProfile};
use healthsight_token::decode_expiry;
use tracing::{debug, info};

/// Reconciles store state with persisted state, then re-persists the
/// result so every tier ends up holding the merged values (this repairs
/// e.g. a cookie that survived while durable storage was wiped).
pub fn bootstrap(store: &SessionStore, vault: &CredentialVault, seed_user: Option<&UserProfile>) {
    let stored_token = vault.load_token();
    let stored_expiry = vault.load_expiry();
    let stored_user = vault.load_user();
    let stored_remember = vault.load_remember();

    let state = store.state();

    if stored_remember != state.remember {
        store.dispatch(SessionAction::SetRemember(stored_remember));
    }

    let next_token = stored_token.or_else(|| state.token.clone());

    // Expiry precedence: storage > in-memory > recomputed from the token.
    let next_expires = stored_expiry
        .or(state.expires_at)
        .or_else(|| next_token.as_deref().and_then(decode_expiry));

    // User precedence: storage > in-memory > server-provided seed.
    let next_user = stored_user
        .or_else(|| state.user.clone())
        .or_else(|| seed_user.cloned());

    let token_changed = next_token != state.token;
    let needs_user_hydration = next_user.is_some() && state.user.is_none();

    if token_changed || needs_user_hydration {
        info!(
            authenticated = next_token.is_some(),
            "session hydrated from persisted state"
        );
        store.dispatch(SessionAction::SetCredentials {
            token: next_token.clone(),
            user: next_user,
            remember: Some(stored_remember),
            expires_at: Some(next_expires),
        });
    } else if next_expires != state.expires_at {
        // Token and user are already right; don't clobber them just to
        // record a better expiry.
        debug!(expires_at = ?next_expires, "expiry reconciled");
        store.dispatch(SessionAction::SetTokenExpiry(next_expires));
    }

    // A surviving token means every tier should now agree.
    if let Some(token) = next_token {
        let reconciled = store.state();
        vault.persist(
            &token,
            &PersistOptions {
                remember: reconciled.remember,
                expires_at: reconciled.expires_at,
                user: reconciled.user,
            },
        );
    }
}
