//! # HealthSight session lifecycle
//!
//! The client-side session subsystem for the HealthSight app: one store
//! of truth for `{token, user, remember, expires_at}`, reconciled with
//! persisted state at startup and watched by a scheduler that forces
//! logout the moment the token lapses.
//!
//! ```text
//! UI pages (login form, logout button)
//!     ↕  dispatch / state / subscribe
//! SessionProvider (this crate)
//!     ├── bootstrap     — runs once: merge cookie-seeded + stored state
//!     ├── ExpiryScheduler — reacts to every change, one timer at most
//!     ↕
//! SessionStore (healthsight-store) — pure state container
//! CredentialVault (healthsight-storage) — cookie / durable / session tiers
//! decode_expiry (healthsight-token) — best-effort `exp` extraction
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use healthsight::{Navigator, SessionProvider};
//! use healthsight_storage::CredentialVault;
//!
//! struct ToLoginPage;
//! impl Navigator for ToLoginPage {
//!     fn to_login(&self) { /* route to /login */ }
//! }
//!
//! # async fn run() {
//! let vault = Arc::new(CredentialVault::in_memory());
//! let provider = SessionProvider::start(vault, Arc::new(ToLoginPage), None);
//! // hand provider.store() to the UI layer...
//! provider.logout();
//! provider.shutdown();
//! # }
//! ```

mod bootstrap;
mod clock;
mod error;
mod login;
mod navigator;
mod provider;
mod scheduler;

pub use bootstrap::bootstrap;
pub use error::SessionError;
pub use login::{LoginResponse, apply_login};
pub use navigator::Navigator;
pub use provider::{LogoutOptions, SessionProvider, SessionSeed};
pub use scheduler::{ExpiryScheduler, SchedulerStatus};

// The rest of the app mostly needs these, so save it the extra imports.
pub use healthsight_store::{SessionAction, SessionState, SessionStore, UserProfile};
pub use healthsight_token::decode_expiry;
