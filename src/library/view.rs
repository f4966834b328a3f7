//! Shelf view controller
//!
//! Renders the book collection as card models and drives the two user
//! actions: open (publish to the handoff channel, then navigate) and
//! remove (behind a confirmation gate). Search re-renders on every
//! keystroke; it is a synchronous in-memory filter, so no debouncing.

use std::sync::Arc;

use serde::Serialize;

use crate::book::BookRecord;
use crate::error::{AppError, Result};
use crate::handoff::HandoffChannel;

use super::store::{LibraryStore, SaveOutcome};

const EMPTY_LIBRARY_MESSAGE: &str = "Your library is empty. Upload a PDF book to get started!";
const NO_MATCH_MESSAGE: &str = "No books match your search.";
const PLACEHOLDER_THUMBNAIL: &str = "PDF";

/// One card on the shelf
#[derive(Debug, Clone, Serialize)]
pub struct BookCard {
    pub id: String,
    /// Display name with the extension stripped
    pub title: String,
    /// Formatted date, e.g. "Mar 5, 2026"
    pub date_added: String,
    /// Placeholder until real thumbnails exist
    pub thumbnail: &'static str,
}

impl BookCard {
    fn from_record(record: &BookRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.display_title(),
            date_added: record.formatted_date(),
            thumbnail: PLACEHOLDER_THUMBNAIL,
        }
    }
}

/// What the shelf shows
#[derive(Debug, Clone, Serialize)]
pub enum LibraryScreen {
    Empty { message: String },
    Shelf { cards: Vec<BookCard> },
}

/// Where the controller sends the user next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Reader,
    Library,
}

/// Controller for the shelf view
pub struct LibraryView {
    store: Arc<LibraryStore>,
    handoff: Arc<HandoffChannel>,
}

impl LibraryView {
    pub fn new(store: Arc<LibraryStore>, handoff: Arc<HandoffChannel>) -> Self {
        Self { store, handoff }
    }

    /// Render the full collection.
    pub async fn render(&self) -> LibraryScreen {
        Self::screen(&self.store.load().await, EMPTY_LIBRARY_MESSAGE)
    }

    /// Render the collection filtered by a search term.
    pub async fn search(&self, term: &str) -> LibraryScreen {
        let message = if term.is_empty() {
            EMPTY_LIBRARY_MESSAGE
        } else {
            NO_MATCH_MESSAGE
        };
        Self::screen(&self.store.search(term).await, message)
    }

    /// Ingest an upload and re-render. A rejected file propagates as
    /// [`AppError::UploadRejected`] with no state change.
    pub async fn upload(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(LibraryScreen, SaveOutcome)> {
        let (_, outcome) = self.store.upload(name, content_type, bytes).await?;
        Ok((self.render().await, outcome))
    }

    /// Hand the chosen record to the reader. Publish completes before the
    /// navigation target is returned, so the reader always finds the
    /// record on arrival.
    pub async fn open(&self, id: &str) -> Result<Navigation> {
        let record = self
            .store
            .find(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("book {id}")))?;
        // A record with neither byte source is corrupt; publishing it
        // would only strand the reader.
        if !record.is_openable() {
            return Err(AppError::Unopenable(record.name.clone()));
        }
        self.handoff.publish(&record).await?;
        Ok(Navigation::Reader)
    }

    /// Remove a record after the confirmation gate. Declining leaves the
    /// library untouched.
    pub async fn remove<F>(&self, id: &str, confirm: F) -> Result<LibraryScreen>
    where
        F: FnOnce(&BookRecord) -> bool,
    {
        if let Some(record) = self.store.find(id).await {
            if confirm(&record) {
                self.store.remove(id).await?;
            }
        }
        Ok(self.render().await)
    }

    fn screen(records: &[BookRecord], empty_message: &str) -> LibraryScreen {
        if records.is_empty() {
            LibraryScreen::Empty {
                message: empty_message.to_string(),
            }
        } else {
            LibraryScreen::Shelf {
                cards: records.iter().map(BookCard::from_record).collect(),
            }
        }
    }
}
