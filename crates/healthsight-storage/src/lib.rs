//! Tiered credential persistence for HealthSight.
//!
//! Session state lives in three places with different lifetimes:
//!
//! 1. **Cookie tier** — short-lived, visible to the server-rendering
//!    step, so the first paint can be authenticated without a round trip.
//! 2. **Durable tier** — survives restarts; used when the user checked
//!    "keep me signed in".
//! 3. **Session tier** — dies with the browsing session; used otherwise.
//!
//! The [`CredentialVault`] is the only thing the rest of the client
//! talks to. It picks tiers by the remember preference, keeps the
//! non-selected tier empty so stale logins can't resurface, and treats
//! every backend as best-effort: a full quota or disabled storage
//! degrades to "nothing stored", never to an error the session layer
//! has to handle.

mod cookie;
mod error;
mod tier;
mod vault;

pub use cookie::{CookieJar, MemoryCookieJar};
pub use error::StorageError;
pub use tier::{MemoryTier, StorageTier};
pub use vault::{
    ClearOptions, CredentialVault, PersistOptions, EXPIRES_KEY, REMEMBER_KEY,
    REMEMBER_MAX_AGE_SECS, SESSION_MAX_AGE_SECS, TOKEN_COOKIE, USER_COOKIE, USER_KEY,
};
