//! Wall-clock reads for expiry arithmetic.
//!
//! Expiry instants are epoch milliseconds because that's what the token
//! carries; timers sleep on the Tokio clock. The two meet exactly once,
//! in the scheduler, which converts a wall-clock ttl into a Tokio
//! deadline at arm time.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in epoch milliseconds.
///
/// A clock before 1970 yields 0, which makes every expiry look lapsed —
/// the safe direction for a credential check.
pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
