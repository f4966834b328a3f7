//! File-backed key-value store
//!
//! Persistent analog of the browser's origin storage: one file per key
//! under a data directory, surviving across process lifetimes. Keys are
//! sanitized into filenames; values are stored verbatim.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::StorageError;

use super::{check_quota, KeyValueStore};

const ENTRY_EXT: &str = "kv";

/// Directory-backed store with an optional capacity in bytes
pub struct FileStore {
    root: PathBuf,
    quota: Option<usize>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>, quota: Option<usize>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root, quota })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        // Keys are well-known identifiers, but never trust them as paths.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .collect();
        self.root.join(format!("{safe}.{ENTRY_EXT}"))
    }

    /// Total bytes currently held across all entries.
    async fn usage_excluding(&self, skip: &Path) -> Result<usize, StorageError> {
        let mut total = 0usize;
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path == skip {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXT) {
                total += entry.metadata().await?.len() as usize;
            }
        }
        Ok(total)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.entry_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.entry_path(key);
        let current = self.usage_excluding(&path).await?;
        check_quota(key, value, current, self.quota)?;

        // Write-then-rename so a rejected or interrupted write never
        // clobbers the previous value.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_across_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = FileStore::open(dir.path(), None).await.unwrap();
            store.set("pdfBookLibrary", "[]").await.unwrap();
        }

        // A fresh instance over the same directory sees the value
        let store = FileStore::open(dir.path(), None).await.unwrap();
        assert_eq!(
            store.get("pdfBookLibrary").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), None).await.unwrap();
        assert!(store.get("nope").await.unwrap().is_none());
        store.remove("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_quota_preserves_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), Some(32)).await.unwrap();

        store.set("k", "small").await.unwrap();
        let err = store.set("k", &"x".repeat(64)).await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("small"));
    }

    #[tokio::test]
    async fn test_keys_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), None).await.unwrap();
        store.set("../escape/attempt", "v").await.unwrap();
        assert_eq!(
            store.get("../escape/attempt").await.unwrap().as_deref(),
            Some("v")
        );
        // Nothing landed outside the root
        assert!(dir.path().join("---escape-attempt.kv").exists());
    }
}
