//! Configuration management for Estante

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub dictionary: DictionaryConfig,
    pub highlights: HighlightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory backing the persistent key-value store
    pub data_dir: PathBuf,
    /// Capacity of the persistent store in bytes, `None` for unlimited
    pub quota_bytes: Option<usize>,
    /// Capacity of the session store in bytes, `None` for unlimited
    pub session_quota_bytes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DictionaryConfig {
    /// Base URL of the definition lookup service; the word is appended as
    /// a URL-encoded path segment
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HighlightsConfig {
    /// Endpoint receiving the highlighted-text mapping; `None` disables
    /// the push entirely
    pub endpoint: Option<String>,
}

/// Roughly the per-origin localStorage budget browsers grant
const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                data_dir: PathBuf::from("./estante-data"),
                quota_bytes: Some(DEFAULT_QUOTA_BYTES),
                session_quota_bytes: Some(DEFAULT_QUOTA_BYTES),
            },
            dictionary: DictionaryConfig {
                endpoint: "https://api.dictionaryapi.dev/api/v2/entries/en".to_string(),
                timeout_secs: 10,
            },
            highlights: HighlightsConfig { endpoint: None },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        Config {
            storage: StorageConfig {
                data_dir: env::var("ESTANTE_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.data_dir),
                quota_bytes: parse_quota("ESTANTE_QUOTA_BYTES", defaults.storage.quota_bytes),
                session_quota_bytes: parse_quota(
                    "ESTANTE_SESSION_QUOTA_BYTES",
                    defaults.storage.session_quota_bytes,
                ),
            },
            dictionary: DictionaryConfig {
                endpoint: env::var("ESTANTE_DICTIONARY_ENDPOINT")
                    .unwrap_or(defaults.dictionary.endpoint),
                timeout_secs: env::var("ESTANTE_DICTIONARY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.dictionary.timeout_secs),
            },
            highlights: HighlightsConfig {
                endpoint: env::var("ESTANTE_HIGHLIGHTS_ENDPOINT").ok(),
            },
        }
    }
}

/// A value of `0` means unlimited.
fn parse_quota(var: &str, default: Option<usize>) -> Option<usize> {
    match env::var(var).ok().and_then(|v| v.parse::<usize>().ok()) {
        Some(0) => None,
        Some(n) => Some(n),
        None => default,
    }
}
