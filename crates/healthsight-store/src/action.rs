//! The four actions that can mutate session state.

use crate::UserProfile;

/// A mutation request for the [`SessionStore`](crate::SessionStore).
///
/// Dispatching one of these is the **only** way session state changes.
/// Page-level code (login form, logout button) and the session layer
/// (bootstrapper, expiry scheduler) all go through the same four doors.
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// Replace the credentials after a login or a bootstrap merge.
    ///
    /// `token` and `user` are replaced unconditionally. `remember` and
    /// `expires_at` are **partial**: `None` means "leave as is", which
    /// is why `expires_at` is doubly optional — the outer level is
    /// "was it provided", the inner is "is the expiry known".
    SetCredentials {
        token: Option<String>,
        user: Option<UserProfile>,
        remember: Option<bool>,
        expires_at: Option<Option<i64>>,
    },

    /// Drop token, user, and expiry together (logout, forced or not).
    /// The remember preference is deliberately left untouched.
    ClearCredentials,

    /// Record the user's "keep me signed in" choice.
    SetRemember(bool),

    /// Set or clear the known expiry instant (epoch milliseconds).
    /// Dispatched by the scheduler when it self-heals a session that
    /// was seeded without one.
    SetTokenExpiry(Option<i64>),
}

impl SessionAction {
    /// Short name for logging.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            SessionAction::SetCredentials { .. } => "set_credentials",
            SessionAction::ClearCredentials => "clear_credentials",
            SessionAction::SetRemember(_) => "set_remember",
            SessionAction::SetTokenExpiry(_) => "set_token_expiry",
        }
    }
}
