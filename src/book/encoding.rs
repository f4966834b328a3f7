//! Encoding and decoding of document bytes
//!
//! Two representations exist for an uploaded document:
//!
//! - an ephemeral handle, a `blob:` URL backed by in-process bytes, valid
//!   only while the registry that minted it is alive;
//! - a durable encoding, a self-contained base64 data URL that survives
//!   in a text-only store and across sessions.
//!
//! Resolution priority when opening is ephemeral handle, then durable
//! encoding, then treating the stored string itself as a renderable URL.

use std::collections::HashMap;
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Prefix of the durable encoding
pub const DATA_URL_PREFIX: &str = "data:application/pdf;base64,";

const BASE64_MARKER: &str = ";base64,";

/// A resolved byte source handed to the viewer
#[derive(Debug, Clone)]
pub enum ViewSource {
    /// Raw document bytes
    Bytes(Arc<Vec<u8>>),
    /// A URL the viewer is expected to fetch itself
    Url(String),
}

/// Encode document bytes into the durable data URL form.
pub fn encode_durable(bytes: &[u8]) -> String {
    format!("{DATA_URL_PREFIX}{}", general_purpose::STANDARD.encode(bytes))
}

/// Decode a durable encoding back into document bytes.
///
/// Accepts any `data:*;base64,` prefix as well as a bare base64 payload.
pub fn decode_durable(encoded: &str) -> Result<Vec<u8>> {
    let payload = match encoded.find(BASE64_MARKER) {
        Some(idx) if encoded.starts_with("data:") => &encoded[idx + BASE64_MARKER.len()..],
        Some(_) => {
            return Err(AppError::Decode(
                "base64 marker without a data URL prefix".to_string(),
            ))
        }
        None => encoded,
    };
    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| AppError::Decode(e.to_string()))
}

/// Resolve a durable encoding into a view source.
///
/// A malformed encoding that still looks like a URL falls back to being
/// treated as directly renderable; anything else is a decode error.
pub fn resolve_durable(encoded: &str) -> Result<ViewSource> {
    match decode_durable(encoded) {
        Ok(bytes) => Ok(ViewSource::Bytes(Arc::new(bytes))),
        Err(err) => {
            if encoded.starts_with("http://")
                || encoded.starts_with("https://")
                || encoded.starts_with("data:")
                || encoded.starts_with("blob:")
            {
                tracing::warn!("Durable encoding undecodable, passing through as URL: {err}");
                Ok(ViewSource::Url(encoded.to_string()))
            } else {
                Err(err)
            }
        }
    }
}

/// Registry of live ephemeral handles
///
/// Every handle created must eventually be released; the registry keeps at
/// most one live handle per record by releasing before replacing.
pub struct HandleRegistry {
    entries: Mutex<HashMap<String, Arc<Vec<u8>>>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Mint a fresh handle URL for `bytes`.
    pub fn create(&self, bytes: Arc<Vec<u8>>) -> String {
        let url = format!("blob:estante/{}", Uuid::new_v4());
        self.entries.lock().insert(url.clone(), bytes);
        url
    }

    /// Release `old` (if any and still live), then mint a fresh handle.
    /// This is the only sanctioned way to re-handle a record's bytes.
    pub fn replace(&self, old: Option<&str>, bytes: Arc<Vec<u8>>) -> String {
        if let Some(old) = old {
            self.release(old);
        }
        self.create(bytes)
    }

    /// Look up the bytes behind a handle URL, if it is still live.
    pub fn resolve(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.entries.lock().get(url).cloned()
    }

    /// Drop a handle. Returns whether it was live.
    pub fn release(&self, url: &str) -> bool {
        self.entries.lock().remove(url).is_some()
    }

    /// Number of live handles (leak check)
    pub fn live_count(&self) -> usize {
        self.entries.lock().len()
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
