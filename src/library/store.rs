//! Library persistence over the key-value store
//!
//! The whole collection is serialized and overwritten on every save, so a
//! save is atomic from the caller's perspective and concurrent writers
//! degrade to last-write-wins rather than interleaved corruption.

use std::sync::Arc;

use crate::book::{encode_durable, BookRecord, HandleRegistry};
use crate::error::{AppError, Result};
use crate::storage::{KeyValueStore, LIBRARY_KEY};

/// How a save landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Everything persisted, durable encodings included
    Full,
    /// Quota forced a retry with durable encodings stripped; metadata
    /// survived, document bytes did not
    MetadataOnly,
}

/// Repository for the book collection
pub struct LibraryStore {
    store: Arc<dyn KeyValueStore>,
    handles: Arc<HandleRegistry>,
}

impl LibraryStore {
    pub fn new(store: Arc<dyn KeyValueStore>, handles: Arc<HandleRegistry>) -> Self {
        Self { store, handles }
    }

    /// Registry minting this library's ephemeral handles
    pub fn handles(&self) -> &Arc<HandleRegistry> {
        &self.handles
    }

    /// Load the collection. Never fails: a missing key is an empty
    /// library, and an unreadable or unparsable one is logged and treated
    /// the same way.
    pub async fn load(&self) -> Vec<BookRecord> {
        let raw = match self.store.get(LIBRARY_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read library: {e}");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(books) => books,
            Err(e) => {
                tracing::warn!("Stored library is not valid JSON, starting empty: {e}");
                Vec::new()
            }
        }
    }

    /// Persist the collection.
    ///
    /// A quota rejection is retried exactly once with the durable encoding
    /// stripped from every record; the outcome tells the caller whether
    /// document bytes were dropped.
    pub async fn save(&self, books: &[BookRecord]) -> Result<SaveOutcome> {
        let serialized = serde_json::to_string(books)?;
        match self
            .store
            .set(LIBRARY_KEY, &serialized)
            .await
            .map_err(AppError::from)
        {
            Ok(()) => Ok(SaveOutcome::Full),
            Err(e) if e.is_quota() => {
                tracing::warn!("Library save over quota, retrying metadata-only: {e}");
                let stripped: Vec<BookRecord> =
                    books.iter().map(BookRecord::metadata_only).collect();
                let serialized = serde_json::to_string(&stripped)?;
                self.store.set(LIBRARY_KEY, &serialized).await?;
                tracing::info!(
                    records = stripped.len(),
                    "Library saved without durable encodings"
                );
                Ok(SaveOutcome::MetadataOnly)
            }
            Err(e) => Err(e),
        }
    }

    /// Append a record and persist.
    pub async fn add(&self, record: BookRecord) -> Result<SaveOutcome> {
        let mut books = self.load().await;
        books.push(record);
        self.save(&books).await
    }

    /// Remove by id, releasing the record's ephemeral handle if live.
    /// Removing an unknown id is a no-op, not an error.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let books = self.load().await;
        let Some(record) = books.iter().find(|b| b.id == id) else {
            return Ok(false);
        };

        if let Some(url) = &record.handle_url {
            self.handles.release(url);
        }

        let remaining: Vec<BookRecord> = books.into_iter().filter(|b| b.id != id).collect();
        self.save(&remaining).await?;
        tracing::info!(%id, "Removed book from library");
        Ok(true)
    }

    pub async fn find(&self, id: &str) -> Option<BookRecord> {
        self.load().await.into_iter().find(|b| b.id == id)
    }

    /// Case-insensitive substring match on the filename. An empty term
    /// returns the whole library; an unmatched term returns an empty list.
    pub async fn search(&self, term: &str) -> Vec<BookRecord> {
        let books = self.load().await;
        if term.is_empty() {
            return books;
        }
        let term = term.to_lowercase();
        books
            .into_iter()
            .filter(|b| b.name.to_lowercase().contains(&term))
            .collect()
    }

    /// Validate and ingest an upload: mint an ephemeral handle and a
    /// durable encoding, then persist the new record.
    pub async fn upload(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(BookRecord, SaveOutcome)> {
        // File pickers do not always report a useful content type, so the
        // extension is accepted as evidence too.
        let is_pdf = content_type.eq_ignore_ascii_case("application/pdf")
            || name.to_lowercase().ends_with(".pdf");
        if !is_pdf {
            return Err(AppError::UploadRejected(format!(
                "'{name}' is not a PDF (content type {content_type})"
            )));
        }

        let size = bytes.len() as u64;
        let bytes = Arc::new(bytes);

        let mut record = BookRecord::new(name, Some(size));
        record.durable = Some(encode_durable(&bytes));
        record.handle_url = Some(self.handles.create(bytes));

        let outcome = match self.add(record.clone()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // The record never made it in, so its handle must not
                // stay live.
                if let Some(url) = &record.handle_url {
                    self.handles.release(url);
                }
                return Err(e);
            }
        };

        tracing::info!(id = %record.id, %name, size, "Book uploaded");
        Ok((record, outcome))
    }
}
