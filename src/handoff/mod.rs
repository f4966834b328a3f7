//! Handoff channel between the shelf view and the reader view
//!
//! The selected record crosses a page navigation through the
//! session-scoped store. Records that are too large to serialize there
//! fall back to a two-part handoff: metadata in the session store, raw
//! bytes in an in-process carry slot. The slot lives exactly as long as
//! the channel instance, so it survives a same-process navigation but not
//! a reload; after a reload the durable encoding is the only route back
//! to the bytes.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::book::{resolve_durable, BookRecord, HandleRegistry, ViewSource};
use crate::error::{Result, StorageError};
use crate::storage::{KeyValueStore, CURRENT_BOOK_KEY};

/// A record plus the byte source the reader should use
#[derive(Debug, Clone)]
pub struct ResolvedBook {
    pub record: BookRecord,
    pub source: ViewSource,
}

struct CarrySlot {
    id: String,
    bytes: Arc<Vec<u8>>,
}

/// Session-store channel with the raw-bytes fallback slot
pub struct HandoffChannel {
    session: Arc<dyn KeyValueStore>,
    handles: Arc<HandleRegistry>,
    slot: Mutex<Option<CarrySlot>>,
}

impl HandoffChannel {
    pub fn new(session: Arc<dyn KeyValueStore>, handles: Arc<HandleRegistry>) -> Self {
        Self {
            session,
            handles,
            slot: Mutex::new(None),
        }
    }

    /// Publish a record for the reader. Completes (including the fallback
    /// path) before returning, so navigation can follow immediately.
    ///
    /// The ephemeral handle cannot cross serialization and is dropped from
    /// the stored form; the durable encoding is kept unless the session
    /// store rejects it, in which case the bytes ride the carry slot.
    pub async fn publish(&self, record: &BookRecord) -> Result<()> {
        let reduced = record.reduced();
        let serialized = serde_json::to_string(&reduced)?;

        match self.session.set(CURRENT_BOOK_KEY, &serialized).await {
            Ok(()) => {
                *self.slot.lock() = None;
                Ok(())
            }
            Err(StorageError::QuotaExceeded { .. }) => {
                tracing::warn!(
                    id = %record.id,
                    "Handoff record over session quota, using two-part handoff"
                );
                let meta = serde_json::to_string(&reduced.metadata_only())?;
                self.session.set(CURRENT_BOOK_KEY, &meta).await?;
                *self.slot.lock() = self.resolve_bytes(record).map(|bytes| CarrySlot {
                    id: record.id.clone(),
                    bytes,
                });
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read back the published record and resolve its bytes.
    ///
    /// Preference order: the carry slot if it matches, then the durable
    /// encoding, then the ephemeral handle if it is still live. `None`
    /// means nothing was published or nothing is resolvable; the caller
    /// redirects to the library.
    pub async fn consume(&self) -> Option<ResolvedBook> {
        let raw = match self.session.get(CURRENT_BOOK_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read handoff record: {e}");
                return None;
            }
        };

        let record: BookRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Handoff record is not valid JSON: {e}");
                return None;
            }
        };

        // Same-process navigation: the slot is taken, not copied, so a
        // second consume has to fall back to the durable routes.
        let carried = {
            let mut slot = self.slot.lock();
            match slot.as_ref() {
                Some(carry) if carry.id == record.id => slot.take(),
                _ => None,
            }
        };
        if let Some(carry) = carried {
            return Some(ResolvedBook {
                record,
                source: ViewSource::Bytes(carry.bytes),
            });
        }

        if let Some(durable) = &record.durable {
            match resolve_durable(durable) {
                Ok(source) => return Some(ResolvedBook { record, source }),
                Err(e) => tracing::warn!(id = %record.id, "Durable encoding unusable: {e}"),
            }
        }

        if let Some(url) = &record.handle_url {
            if let Some(bytes) = self.handles.resolve(url) {
                return Some(ResolvedBook {
                    record,
                    source: ViewSource::Bytes(bytes),
                });
            }
        }

        tracing::warn!(id = %record.id, "Published record has no resolvable byte source");
        None
    }

    fn resolve_bytes(&self, record: &BookRecord) -> Option<Arc<Vec<u8>>> {
        if let Some(url) = &record.handle_url {
            if let Some(bytes) = self.handles.resolve(url) {
                return Some(bytes);
            }
        }
        if let Some(durable) = &record.durable {
            if let Ok(bytes) = crate::book::decode_durable(durable) {
                return Some(Arc::new(bytes));
            }
        }
        tracing::warn!(id = %record.id, "No bytes available for the carry slot");
        None
    }
}
