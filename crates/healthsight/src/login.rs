//! Applying a backend login response to the session.
//!
//! The HTTP call itself belongs to page-level code; this module takes
//! the already-parsed response and turns it into consistent store +
//! storage state in one move.

use serde::Deserialize;
use tracing::info;

use healthsight_storage::{CredentialVault, PersistOptions};
use healthsight_store::{SessionAction, SessionStore, UserProfile};
use healthsight_token::decode_expiry;

use crate::SessionError;
use crate::clock::now_ms;

/// The backend's `POST /auth/login` response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// The bearer token. The backend always sends one on success, but
    /// it is validated here anyway — acting on an empty token would
    /// wedge the session in a half-authenticated state.
    #[serde(default)]
    pub access_token: String,

    /// Token scheme, nominally `"Bearer"`. Unused by the session layer.
    #[serde(default)]
    pub token_type: Option<String>,

    /// Token lifetime in seconds, when the backend provides it.
    #[serde(default)]
    pub expires_in: Option<i64>,

    /// Profile of the user that just signed in.
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Installs a successful login into the store and all storage tiers.
///
/// The expiry is taken from `expires_in` when present; otherwise it is
/// decoded out of the token. Both may be absent, in which case the
/// session runs with an unknown expiry until the scheduler or a later
/// bootstrap learns better.
///
/// # Errors
///
/// [`SessionError::MissingAccessToken`] when the response carries no
/// token. Nothing is changed in that case; the caller shows the user
/// an error.
pub fn apply_login(
    store: &SessionStore,
    vault: &CredentialVault,
    response: LoginResponse,
    remember: bool,
) -> Result<(), SessionError> {
    if response.access_token.is_empty() {
        return Err(SessionError::MissingAccessToken);
    }

    let expires_at = response
        .expires_in
        .map(|secs| now_ms() + secs * 1_000)
        .or_else(|| decode_expiry(&response.access_token));

    info!(
        has_user = response.user.is_some(),
        remember, "login applied"
    );

    store.dispatch(SessionAction::SetCredentials {
        token: Some(response.access_token.clone()),
        user: response.user.clone(),
        remember: Some(remember),
        expires_at: Some(expires_at),
    });

    vault.persist(
        &response.access_token,
        &PersistOptions {
            remember,
            expires_at,
            user: response.user,
        },
    );

    Ok(())
}
