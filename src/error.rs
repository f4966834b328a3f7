//! Error types for the Estante core

use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
///
/// Every failure in the system is caught at the boundary where it occurs
/// and surfaced as a user-visible render state; nothing here is fatal to
/// the process. The variants mirror that boundary taxonomy.
#[derive(Error, Debug)]
pub enum AppError {
    /// The uploaded file is not a PDF. No state change has happened.
    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    /// A durable encoding could not be decoded back into bytes.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A record has neither a resolvable handle nor a durable encoding.
    #[error("Book is not openable: {0}")]
    Unopenable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// The embedded viewer failed to load or render.
    #[error("Viewer init error: {0}")]
    ViewerInit(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-value backend errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// The write would push the store past its capacity limit.
    /// The store is left unchanged when this is returned.
    #[error("Quota exceeded writing '{key}': {attempted} bytes against a {limit} byte limit")]
    QuotaExceeded {
        key: String,
        attempted: usize,
        limit: usize,
    },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Dictionary lookup errors
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Word not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl AppError {
    /// True when a retry with a reduced payload may succeed.
    pub fn is_quota(&self) -> bool {
        matches!(self, AppError::Storage(StorageError::QuotaExceeded { .. }))
    }
}
