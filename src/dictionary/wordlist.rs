//! Saved-word list over the persistent store

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{KeyValueStore, SAVED_WORDS_KEY};

use super::lookup::Definition;

/// One saved word, keyed case-sensitively by `word`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedWord {
    pub word: String,
    pub definition: Definition,
}

/// Word list persisted under `savedWords`
///
/// Lists are small, so unlike the book library there is no reduced-form
/// retry; quota errors surface typed to the caller.
pub struct WordListStore {
    store: Arc<dyn KeyValueStore>,
}

impl WordListStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the list. Missing, unreadable, or corrupt entries all yield
    /// an empty list; this never fails.
    pub async fn words(&self) -> Vec<SavedWord> {
        let raw = match self.store.get(SAVED_WORDS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read saved words: {e}");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(words) => words,
            Err(e) => {
                tracing::warn!("Saved words entry is not valid JSON: {e}");
                Vec::new()
            }
        }
    }

    /// Append a word unless it is already present (exact match).
    /// Returns whether the list changed.
    pub async fn save_word(&self, word: &str, definition: Definition) -> Result<bool> {
        let mut words = self.words().await;
        if words.iter().any(|entry| entry.word == word) {
            return Ok(false);
        }
        words.push(SavedWord {
            word: word.to_string(),
            definition,
        });
        self.persist(&words).await?;
        tracing::info!(word, "Saved word");
        Ok(true)
    }

    /// Drop a word by exact match. Returns whether the list changed.
    pub async fn remove_word(&self, word: &str) -> Result<bool> {
        let mut words = self.words().await;
        let before = words.len();
        words.retain(|entry| entry.word != word);
        if words.len() == before {
            return Ok(false);
        }
        self.persist(&words).await?;
        Ok(true)
    }

    async fn persist(&self, words: &[SavedWord]) -> Result<()> {
        let serialized = serde_json::to_string(words)?;
        self.store.set(SAVED_WORDS_KEY, &serialized).await?;
        Ok(())
    }
}
