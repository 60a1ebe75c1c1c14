//! Session state types: what the client knows about the signed-in user.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

/// Cached display data for the signed-in user.
///
/// This is a convenience copy of what the backend returned at login —
/// it is **not authoritative**. The backend may know a newer name or
/// email; pages that care should refetch. Every field is optional
/// because the profile can arrive from several places (login response,
/// server-seeded cookie, client storage) with different completeness.
///
/// Unknown fields from the backend are kept in `extra` so a newer API
/// response survives a round trip through storage unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Fields this client version doesn't model. Round-tripped as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The full authentication state of the client.
///
/// Mutated only through [`SessionAction`](crate::SessionAction) dispatch.
///
/// Invariants the session layer maintains (not enforced here, since the
/// store is a dumb container):
/// - When `token` is `None`, `user` and `expires_at` are meaningless and
///   get cleared together on logout.
/// - When both are set, `expires_at` matches the expiry encoded in
///   `token` (the scheduler treats `expires_at` as authoritative).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Opaque bearer credential. `None` means unauthenticated.
    pub token: Option<String>,

    /// Cached profile for display. `None` until hydrated.
    pub user: Option<UserProfile>,

    /// Whether the session should survive a browser restart.
    /// Independent of `token` — it outlives logout.
    pub remember: bool,

    /// Absolute expiry in epoch milliseconds. `None` means not yet
    /// computed (the scheduler self-heals this from the token).
    pub expires_at: Option<i64>,
}

impl SessionState {
    /// Whether a token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
