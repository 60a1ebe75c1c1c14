//! The credential vault: one front door for all three storage tiers.
//!
//! Everything the session layer persists goes through here. The vault
//! owns the tier-selection rules (remember → durable, otherwise →
//! session-scoped), the precedence rules for reads, and the best-effort
//! contract: no storage failure ever crosses this boundary.

use std::sync::Arc;

use healthsight_store::UserProfile;
use tracing::{trace, warn};

use crate::cookie::{build_cookie, read_cookie};
use crate::{CookieJar, StorageError, StorageTier};

// ---------------------------------------------------------------------------
// Keys and lifetimes
// ---------------------------------------------------------------------------

/// Cookie holding the raw bearer token (URL-encoded).
pub const TOKEN_COOKIE: &str = "authToken";
/// Cookie holding a display subset of the user profile (URL-encoded JSON).
pub const USER_COOKIE: &str = "authUser";
/// Tier key for the remember preference (`"1"` / `"0"`), durable only.
pub const REMEMBER_KEY: &str = "authToken:remember";
/// Tier key for the expiry instant (epoch milliseconds, decimal).
pub const EXPIRES_KEY: &str = "authToken:expires";
/// Tier key for the full user profile (JSON).
pub const USER_KEY: &str = "authToken:user";

/// Cookie lifetime without the remember preference: 2 hours.
pub const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 2;
/// Cookie lifetime with the remember preference: 14 days.
pub const REMEMBER_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 14;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What to persist alongside a token.
#[derive(Debug, Clone, Default)]
pub struct PersistOptions {
    /// Selects the client tier (durable vs session-scoped) and the
    /// cookie lifetime.
    pub remember: bool,
    /// Expiry mirror. `None` removes any stored expiry.
    pub expires_at: Option<i64>,
    /// Profile mirror. `None` removes any stored profile.
    pub user: Option<UserProfile>,
}

/// What to keep when clearing.
#[derive(Debug, Clone, Default)]
pub struct ClearOptions {
    /// Keep the remember preference. Forced (expiry-triggered) logout
    /// sets this; the user's choice shouldn't be punished by a lapsed
    /// token.
    pub preserve_remember: bool,
}

// ---------------------------------------------------------------------------
// CredentialVault
// ---------------------------------------------------------------------------

/// Reads and writes session credentials across the cookie, durable, and
/// session-scoped tiers.
///
/// Exactly one client tier is authoritative at a time, selected by the
/// remember preference; `persist` always scrubs the other one so a
/// stale login can't be read back after the preference flips.
pub struct CredentialVault {
    cookies: Arc<dyn CookieJar>,
    durable: Arc<dyn StorageTier>,
    session: Arc<dyn StorageTier>,
}

impl CredentialVault {
    pub fn new(
        cookies: Arc<dyn CookieJar>,
        durable: Arc<dyn StorageTier>,
        session: Arc<dyn StorageTier>,
    ) -> Self {
        Self {
            cookies,
            durable,
            session,
        }
    }

    /// A vault over in-memory backends. Used by the demo and wherever
    /// no platform storage exists.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(crate::MemoryCookieJar::new()),
            Arc::new(crate::MemoryTier::new()),
            Arc::new(crate::MemoryTier::new()),
        )
    }

    // -- Writes -----------------------------------------------------------

    /// Persists a token and its companions across all tiers.
    ///
    /// - Token cookie: 2 h lifetime, or 14 d when remembered.
    /// - Token, expiry, and profile go to the tier selected by
    ///   `remember`; the other tier is scrubbed.
    /// - The profile's display subset is mirrored into [`USER_COOKIE`]
    ///   so server rendering can greet the user without a round trip.
    ///
    /// Every individual write is best-effort.
    pub fn persist(&self, token: &str, opts: &PersistOptions) {
        let max_age = if opts.remember {
            REMEMBER_MAX_AGE_SECS
        } else {
            SESSION_MAX_AGE_SECS
        };
        let secure = self.cookies.is_secure();

        swallow(
            "token cookie write",
            self.cookies
                .write(&build_cookie(TOKEN_COOKIE, token, max_age, secure)),
        );

        swallow(
            "remember flag write",
            self.durable
                .set(REMEMBER_KEY, if opts.remember { "1" } else { "0" }),
        );

        let (selected, scrubbed) = self.tiers_for(opts.remember);

        swallow("token tier write", selected.set(TOKEN_COOKIE, token));
        swallow("token tier scrub", scrubbed.remove(TOKEN_COOKIE));

        match opts.expires_at {
            Some(expires_at) => {
                swallow(
                    "expiry tier write",
                    selected.set(EXPIRES_KEY, &expires_at.to_string()),
                );
            }
            None => {
                swallow("expiry tier remove", selected.remove(EXPIRES_KEY));
            }
        }
        swallow("expiry tier scrub", scrubbed.remove(EXPIRES_KEY));

        match &opts.user {
            Some(user) => {
                if let Ok(json) = serde_json::to_string(user) {
                    swallow("user tier write", selected.set(USER_KEY, &json));
                }
                swallow(
                    "user cookie write",
                    self.cookies
                        .write(&build_cookie(USER_COOKIE, &display_subset(user), max_age, secure)),
                );
            }
            None => {
                swallow("user tier remove", selected.remove(USER_KEY));
                swallow(
                    "user cookie remove",
                    self.cookies.write(&build_cookie(USER_COOKIE, "", 0, secure)),
                );
            }
        }
        swallow("user tier scrub", scrubbed.remove(USER_KEY));
    }

    /// Removes every persisted credential.
    ///
    /// The remember preference is removed too unless
    /// [`ClearOptions::preserve_remember`] is set.
    pub fn clear(&self, opts: &ClearOptions) {
        let secure = self.cookies.is_secure();
        swallow(
            "token cookie delete",
            self.cookies.write(&build_cookie(TOKEN_COOKIE, "", 0, secure)),
        );
        swallow(
            "user cookie delete",
            self.cookies.write(&build_cookie(USER_COOKIE, "", 0, secure)),
        );

        for tier in [&self.durable, &self.session] {
            swallow("token tier remove", tier.remove(TOKEN_COOKIE));
            swallow("expiry tier remove", tier.remove(EXPIRES_KEY));
            swallow("user tier remove", tier.remove(USER_KEY));
        }

        if !opts.preserve_remember {
            swallow("remember flag remove", self.durable.remove(REMEMBER_KEY));
        }
    }

    // -- Reads ------------------------------------------------------------

    /// Loads the token. Cookie first (most recently set and
    /// server-visible), then durable, then session-scoped.
    pub fn load_token(&self) -> Option<String> {
        if let Some(token) = self.read_cookie_value(TOKEN_COOKIE) {
            trace!("token read from cookie tier");
            return Some(token);
        }
        self.read_tier(&self.durable, TOKEN_COOKIE, "durable")
            .or_else(|| self.read_tier(&self.session, TOKEN_COOKIE, "session"))
    }

    /// Loads the expiry. Session-scoped first — it reflects the
    /// currently active login, while durable may hold a leftover
    /// remembered login already superseded.
    pub fn load_expiry(&self) -> Option<i64> {
        self.read_tier(&self.session, EXPIRES_KEY, "session")
            .or_else(|| self.read_tier(&self.durable, EXPIRES_KEY, "durable"))
            .and_then(|raw| raw.parse().ok())
    }

    /// Loads the profile. Cookie first, then session-scoped, then
    /// durable.
    pub fn load_user(&self) -> Option<UserProfile> {
        let raw = self
            .read_cookie_value(USER_COOKIE)
            .or_else(|| self.read_tier(&self.session, USER_KEY, "session"))
            .or_else(|| self.read_tier(&self.durable, USER_KEY, "durable"))?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(%err, "stored user profile is not valid JSON");
                None
            }
        }
    }

    /// Loads the remember preference. Absent or unreadable means `false`.
    pub fn load_remember(&self) -> bool {
        self.read_tier(&self.durable, REMEMBER_KEY, "durable")
            .is_some_and(|flag| flag == "1")
    }

    // -- Internals --------------------------------------------------------

    /// (selected, scrubbed) pair for the remember preference.
    fn tiers_for(&self, remember: bool) -> (&Arc<dyn StorageTier>, &Arc<dyn StorageTier>) {
        if remember {
            (&self.durable, &self.session)
        } else {
            (&self.session, &self.durable)
        }
    }

    fn read_cookie_value(&self, name: &str) -> Option<String> {
        let header = swallow("cookie read", self.cookies.read_all())?;
        read_cookie(&header, name)
    }

    fn read_tier(&self, tier: &Arc<dyn StorageTier>, key: &str, which: &'static str) -> Option<String> {
        let value = swallow("tier read", tier.get(key))?;
        if value.is_some() {
            trace!(key, tier = which, "value read");
        }
        value
    }
}

/// Logs and discards a storage failure. The vault's whole contract is
/// that the session keeps working in memory when storage doesn't.
fn swallow<T>(what: &'static str, result: Result<T, StorageError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(%err, what, "storage access failed; continuing without it");
            None
        }
    }
}

/// The `{fullName, email}` subset mirrored into the user cookie.
fn display_subset(user: &UserProfile) -> String {
    let mut subset = serde_json::Map::new();
    if let Some(full_name) = &user.full_name {
        subset.insert("fullName".to_string(), serde_json::json!(full_name));
    }
    if let Some(email) = &user.email {
        subset.insert("email".to_string(), serde_json::json!(email));
    }
    serde_json::Value::Object(subset).to_string()
}
