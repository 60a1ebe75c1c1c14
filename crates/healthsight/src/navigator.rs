//! Navigation hook for leaving the authenticated surface.
//!
//! The session layer doesn't know how the host routes — browser
//! history, a desktop shell, a test recorder. It only ever needs one
//! move: go to the login surface. Hosts implement [`Navigator`] with
//! their router; tests implement it with a counter.

/// Routes the user to the login surface.
///
/// Called on explicit logout and on expiry-triggered forced logout.
/// `Send + Sync + 'static` because the scheduler task calls it from
/// wherever Tokio happens to run that task.
pub trait Navigator: Send + Sync + 'static {
    /// Navigate to the login surface. Infallible by design: once the
    /// session is gone, leaving is the only remaining move, and there
    /// is nobody left to report a failure to.
    fn to_login(&self);
}
