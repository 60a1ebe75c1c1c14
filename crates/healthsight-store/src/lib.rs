//! Session state container for HealthSight.
//!
//! This crate holds the single source of truth for the client's
//! authentication state:
//!
//! 1. **State** ([`SessionState`], [`UserProfile`]) — what is currently
//!    known about the signed-in user.
//! 2. **Actions** ([`SessionAction`]) — the only four ways that state
//!    may change.
//! 3. **Store** ([`SessionStore`]) — dispatch, snapshot, and subscribe.
//!
//! # How it fits in the stack
//!
//! ```text
//! Session layer (above)  ← bootstraps the store, schedules expiry logout
//!     ↕
//! Store layer (this crate)  ← pure state, no I/O
//!     ↕
//! Storage layer (beside)  ← persists what the store holds
//! ```
//!
//! The store performs no storage I/O of its own. Persistence is the
//! caller's job; keeping side effects out of here is what makes every
//! dispatch safe to reason about and trivial to test.

mod action;
mod state;
mod store;

pub use action::SessionAction;
pub use state::{SessionState, UserProfile};
pub use store::{SessionStore, SubscriptionId};
