//! The storage tier seam: a key-value backend with a lifetime.
//!
//! The vault doesn't care whether a tier is browser `localStorage`,
//! `sessionStorage`, or an in-memory map in a test. It only needs
//! get/set/remove over string keys. Hosts implement [`StorageTier`]
//! over whatever the platform provides; [`MemoryTier`] is the built-in
//! implementation used by the demo and the test suite.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::StorageError;

/// A key-value storage backend.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` so a tier can be shared between the UI side
/// and the scheduler task for the lifetime of the provider.
pub trait StorageTier: Send + Sync + 'static {
    /// Reads a value. `Ok(None)` means "not present" — only environment
    /// failures are errors.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// An in-memory [`StorageTier`].
///
/// Stands in for browser storage wherever none exists: tests, the demo
/// binary, server-side rendering. Two instances share nothing.
#[derive(Debug, Default)]
pub struct MemoryTier {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageTier for MemoryTier {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .expect("memory tier lock poisoned")
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .expect("memory tier lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .expect("memory tier lock poisoned")
            .remove(key);
        Ok(())
    }
}
