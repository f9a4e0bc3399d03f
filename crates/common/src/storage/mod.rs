//! Key-value storage abstraction
//!
//! Models browser-style client storage: string keys, string values,
//! synchronous access. Persistent and session scopes are two instances of
//! the same trait.

pub mod error;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;

/// Synchronous string key-value store.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Backend failures (I/O, corrupted backing file).
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`StorageError::QuotaExceeded`] when the backend rejects the write,
    /// or any backend failure.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}
