//! Book record type
//!
//! Serialized shape matches the persistent store's wire format: `id`,
//! `name`, `dateAdded`, `data` (ephemeral handle URL), `blobData`
//! (durable base64 data URL), `size`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One uploaded document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    /// Opaque unique token, the sole lookup key
    pub id: String,
    /// Original filename, used as the display label
    pub name: String,
    /// Creation timestamp (RFC 3339 on the wire)
    #[serde(rename = "dateAdded")]
    pub date_added: DateTime<Utc>,
    /// Ephemeral handle URL; valid only within the process that created it
    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub handle_url: Option<String>,
    /// Durable base64 data URL; absent after a quota fallback
    #[serde(rename = "blobData", skip_serializing_if = "Option::is_none")]
    pub durable: Option<String>,
    /// Informational size in bytes
    #[serde(rename = "size", skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl BookRecord {
    /// Create a record with a fresh id and the current timestamp.
    /// Byte representations are attached by the upload path.
    pub fn new(name: impl Into<String>, size_bytes: Option<u64>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            date_added: Utc::now(),
            handle_url: None,
            durable: None,
            size_bytes,
        }
    }

    /// Display label with the file extension stripped
    pub fn display_title(&self) -> String {
        std::path::Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }

    /// Date formatted for the card, e.g. "Mar 5, 2026"
    pub fn formatted_date(&self) -> String {
        self.date_added.format("%b %-d, %Y").to_string()
    }

    /// At least one byte source must be present for the record to be
    /// usable; a record with neither is corrupt.
    pub fn is_openable(&self) -> bool {
        self.handle_url.is_some() || self.durable.is_some()
    }

    /// Copy with the durable encoding dropped (quota fallback shape)
    pub fn metadata_only(&self) -> Self {
        Self {
            durable: None,
            ..self.clone()
        }
    }

    /// Copy safe to serialize across a navigation: the ephemeral handle
    /// cannot cross serialization and is dropped.
    pub fn reduced(&self) -> Self {
        Self {
            handle_url: None,
            ..self.clone()
        }
    }
}
