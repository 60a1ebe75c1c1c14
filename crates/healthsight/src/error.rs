//! Error types for the session layer.

/// Errors the session layer surfaces to page-level callers.
///
/// Almost everything in this layer degrades silently (storage failures,
/// malformed tokens, lapsed sessions are all ordinary control flow).
/// The exception is a login response the core cannot act on — the user
/// needs to see that something went wrong.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The login collaborator returned a response without an access
    /// token. Credentials were not changed.
    #[error("login response did not include an access token")]
    MissingAccessToken,
}
