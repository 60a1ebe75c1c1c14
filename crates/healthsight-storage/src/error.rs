//! Error type for storage backends.

/// Errors a storage backend may report.
///
/// These exist for the *tier* boundary, not the public one: the
/// [`CredentialVault`](crate::CredentialVault) swallows every one of
/// them (logging a warning), because browser-style storage is allowed
/// to be absent, full, or blocked and the session must keep working
/// in memory regardless.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend is not usable in this environment at all
    /// (storage disabled, no browser context, jar not wired up).
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused a write (quota exceeded, read-only mode).
    #[error("storage write rejected: {0}")]
    WriteRejected(String),
}
