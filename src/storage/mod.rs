//! Key-value storage backends
//!
//! The persistent and session stores are ambient, unversioned, text-only
//! key-value state. Writes are whole-value overwrites and either land
//! completely or are rejected; a rejected write leaves the store unchanged.

mod file_store;
mod memory_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

use async_trait::async_trait;

use crate::error::StorageError;

/// Persistent store entry holding the serialized book collection
pub const LIBRARY_KEY: &str = "pdfBookLibrary";
/// Persistent store entry holding the saved word list
pub const SAVED_WORDS_KEY: &str = "savedWords";
/// Session store entry holding the reduced handoff record
pub const CURRENT_BOOK_KEY: &str = "currentBook";

/// Text-only key-value store
///
/// Capacity is accounted over the total of stored keys and values; a `set`
/// that would exceed the configured quota fails with
/// [`StorageError::QuotaExceeded`].
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Missing keys are `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, overwriting any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Deleting a missing key is a no-op.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Quota check shared by the backends.
///
/// `current` is the store's total usage in bytes with the old value of the
/// key already subtracted.
fn check_quota(
    key: &str,
    value: &str,
    current: usize,
    quota: Option<usize>,
) -> Result<(), StorageError> {
    let attempted = key.len() + value.len();
    if let Some(limit) = quota {
        if current + attempted > limit {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                attempted,
                limit,
            });
        }
    }
    Ok(())
}
