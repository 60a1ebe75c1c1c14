//! The cookie tier: short-lived, server-visible credential storage.
//!
//! Cookies are the one tier a server-rendering step can read, which is
//! why the token and a display subset of the user profile are mirrored
//! here. The [`CookieJar`] trait abstracts over where cookies actually
//! live: a real host bridges to the platform cookie store, while
//! [`MemoryCookieJar`] backs tests, demos, and server-side execution.
//!
//! Values are URL-encoded on the way in and decoded on the way out, and
//! every cookie is written `Path=/; SameSite=Lax` with `Secure` added
//! when the jar reports an HTTPS context.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::StorageError;

/// Access to a cookie store.
pub trait CookieJar: Send + Sync + 'static {
    /// Returns all cookies as a `name=value; name2=value2` header
    /// string, values still URL-encoded.
    fn read_all(&self) -> Result<String, StorageError>;

    /// Accepts a serialized cookie with attributes
    /// (`name=value; Path=/; Max-Age=...`). A `Max-Age=0` write is a
    /// deletion.
    fn write(&self, set_cookie: &str) -> Result<(), StorageError>;

    /// Whether this jar serves an HTTPS context. Controls the `Secure`
    /// attribute on writes.
    fn is_secure(&self) -> bool {
        false
    }
}

/// Renders a cookie string with the attributes every HealthSight cookie
/// carries.
pub(crate) fn build_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{name}={}; Path=/; SameSite=Lax; Max-Age={max_age_secs}{secure}",
        urlencoding::encode(value)
    )
}

/// Finds `name` in a cookie header string and returns its decoded value.
///
/// An empty or undecodable value counts as absent — a deleted-but-not-
/// yet-expunged cookie must not shadow the client-side tiers.
pub(crate) fn read_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|entry| entry.strip_prefix(name)?.strip_prefix('='))
        .and_then(|raw| urlencoding::decode(raw).ok())
        .map(|decoded| decoded.into_owned())
        .filter(|value| !value.is_empty())
}

/// An in-memory [`CookieJar`].
///
/// Honors enough cookie semantics for the session layer: last write per
/// name wins, `Max-Age=0` deletes. Expiry clocks and domains are not
/// modeled — the vault never relies on them.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, String>>,
    https: bool,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// A jar that reports an HTTPS context, so writes carry `Secure`.
    pub fn with_https() -> Self {
        Self {
            https: true,
            ..Self::default()
        }
    }
}

impl CookieJar for MemoryCookieJar {
    fn read_all(&self) -> Result<String, StorageError> {
        let cookies = self.cookies.lock().expect("cookie jar lock poisoned");
        Ok(cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "))
    }

    fn write(&self, set_cookie: &str) -> Result<(), StorageError> {
        let mut parts = set_cookie.split(';').map(str::trim);
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            return Err(StorageError::WriteRejected(
                "cookie missing name=value pair".to_string(),
            ));
        };

        let deleted = parts.any(|attr| {
            attr.strip_prefix("Max-Age=")
                .is_some_and(|age| age.trim() == "0")
        });

        let mut cookies = self.cookies.lock().expect("cookie jar lock poisoned");
        if deleted {
            cookies.remove(name);
        } else {
            cookies.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    fn is_secure(&self) -> bool {
        self.https
    }
}
