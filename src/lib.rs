//! Estante
//!
//! Core of a personal PDF library: upload and persist books in a
//! quota-bounded key-value store, browse and search the shelf, hand a
//! selected book off to the reader, and look up and save word
//! definitions. The embedded page-rendering widget and the dictionary
//! service are opaque collaborators behind seams in [`reader`] and
//! [`dictionary`].

pub mod book;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod handoff;
pub mod library;
pub mod reader;
pub mod storage;

pub use book::{BookRecord, HandleRegistry, ViewSource};
pub use config::Config;
pub use dictionary::{Definition, DictionaryClient, WordListStore};
pub use error::{AppError, LookupError, Result, StorageError};
pub use handoff::HandoffChannel;
pub use library::{LibraryStore, LibraryView, SaveOutcome};
pub use reader::{DocumentViewer, HighlightLog, ReaderBootstrap};
