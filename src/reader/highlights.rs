//! Highlighted-text log
//!
//! A page-number to highlighted-strings map with observable mutation:
//! subscribers are notified on every addition. The map can be pushed to a
//! save endpoint fire-and-forget; the response is ignored beyond logging.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::viewer::Subscription;

type HighlightListener = Box<dyn Fn(u32, &str) + Send + Sync>;

/// Observable store of highlighted text per page
pub struct HighlightLog {
    entries: Mutex<BTreeMap<u32, Vec<String>>>,
    listeners: Arc<Mutex<HashMap<u64, Arc<HighlightListener>>>>,
    next_listener_id: AtomicU64,
}

impl HighlightLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// Record highlighted text and notify subscribers.
    pub fn add(&self, page: u32, text: impl Into<String>) {
        let text = text.into();
        self.entries
            .lock()
            .entry(page)
            .or_default()
            .push(text.clone());

        let listeners: Vec<Arc<HighlightListener>> =
            self.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener(page, &text);
        }
    }

    /// Current page-to-strings mapping
    pub fn snapshot(&self) -> BTreeMap<u32, Vec<String>> {
        self.entries.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Observe additions. The returned subscription unregisters the
    /// listener when cancelled.
    pub fn subscribe(&self, listener: impl Fn(u32, &str) + Send + Sync + 'static) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, Arc::new(Box::new(listener)));

        let listeners = Arc::clone(&self.listeners);
        Subscription::new(move || {
            listeners.lock().remove(&id);
        })
    }

    /// POST the mapping to the save endpoint. Failures are logged and
    /// swallowed; nothing downstream depends on the response.
    pub async fn flush(&self, client: &reqwest::Client, endpoint: &str) {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return;
        }

        match client.post(endpoint).json(&snapshot).send().await {
            Ok(response) => {
                tracing::info!(
                    status = %response.status(),
                    pages = snapshot.len(),
                    "Pushed highlighted text"
                );
            }
            Err(e) => tracing::error!("Failed to push highlighted text: {e}"),
        }
    }

    /// Fire-and-forget variant of [`flush`](Self::flush).
    pub fn flush_in_background(self: &Arc<Self>, client: reqwest::Client, endpoint: String) {
        let log = Arc::clone(self);
        tokio::spawn(async move {
            log.flush(&client, &endpoint).await;
        });
    }
}

impl Default for HighlightLog {
    fn default() -> Self {
        Self::new()
    }
}
