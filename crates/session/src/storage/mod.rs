//! Persistent Token Store: durable key/value storage for the session.
//!
//! The session store keeps two entries here (see [`keys`]): the bearer token
//! and, for offline demo accounts, a pre-resolved identity record.
//!
//! # Implementations
//!
//! - [`MemoryTokenStore`] - in-process map, lost on exit
//! - [`FileTokenStore`] - JSON file that survives restarts
//! - [`HeadlessTokenStore`] - no durable storage at all (non-interactive runs)

mod error;
mod file;
mod memory;

pub use error::StorageError;
pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

/// Keys used by the session store.
pub mod keys {
    /// Key for the bearer token issued at login.
    pub const ACCESS_TOKEN: &str = "access_token";

    /// Key for a JSON-serialized identity used by offline demo accounts.
    pub const DEMO_IDENTITY: &str = "demo_user";
}

/// Durable string key/value storage.
///
/// Implementations must be safe to share across tasks; each call is
/// expected to be applied before it returns.
pub trait TokenStore: Send + Sync {
    /// Whether durable storage exists in this context at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be updated.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage for contexts without any durable medium.
///
/// Reads find nothing and writes fail, so the session store treats the user
/// as signed out without contacting the backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessTokenStore;

impl TokenStore for HeadlessTokenStore {
    fn is_available(&self) -> bool {
        false
    }

    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}
