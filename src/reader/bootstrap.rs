//! Reader bootstrap
//!
//! On load the reader consumes the handoff channel, resolves the record
//! back into a viewable source, and hands it to the embedded viewer.
//! Lifecycle is `Loading -> Viewing` on success, `Loading -> Error` on any
//! failure, and `Error -> Loading` on retry. No failure here is fatal:
//! the worst case is a redirect back to the library.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::handoff::{HandoffChannel, ResolvedBook};
use crate::library::Navigation;

use super::highlights::HighlightLog;
use super::viewer::{DocumentViewer, Subscription, ViewRequest, ViewerSession};

const NO_BOOK_MESSAGE: &str = "No book selected. Go to library to select a book.";

/// Reader lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Loading,
    Viewing,
    Error,
}

/// What the reader page shows
#[derive(Debug, Clone)]
pub enum ReaderScreen {
    /// Nothing was published; the caller redirects after a short delay.
    NoBookSelected {
        message: String,
        redirect: Navigation,
    },
    Viewing {
        title: String,
    },
    /// Inline error with a manual retry and a return-to-library action
    Error {
        message: String,
        retry_available: bool,
        return_to: Navigation,
    },
}

/// Boots the reader view from the handoff channel
pub struct ReaderBootstrap {
    handoff: Arc<HandoffChannel>,
    viewer: Arc<dyn DocumentViewer>,
    highlights: Arc<HighlightLog>,
    state: Mutex<ReaderState>,
    current: Mutex<Option<ResolvedBook>>,
    session: Mutex<Option<Arc<dyn ViewerSession>>>,
    annotation_sub: Mutex<Option<Subscription>>,
}

impl ReaderBootstrap {
    pub fn new(
        handoff: Arc<HandoffChannel>,
        viewer: Arc<dyn DocumentViewer>,
        highlights: Arc<HighlightLog>,
    ) -> Self {
        Self {
            handoff,
            viewer,
            highlights,
            state: Mutex::new(ReaderState::Loading),
            current: Mutex::new(None),
            session: Mutex::new(None),
            annotation_sub: Mutex::new(None),
        }
    }

    /// Consume the handoff and open the viewer.
    pub async fn start(&self) -> ReaderScreen {
        *self.state.lock() = ReaderState::Loading;

        match self.handoff.consume().await {
            Some(resolved) => {
                *self.current.lock() = Some(resolved);
                self.open_current().await
            }
            None => {
                tracing::info!("No book published for the reader, redirecting to library");
                *self.state.lock() = ReaderState::Error;
                ReaderScreen::NoBookSelected {
                    message: NO_BOOK_MESSAGE.to_string(),
                    redirect: Navigation::Library,
                }
            }
        }
    }

    /// Retry after a viewer failure. Reuses the already-consumed book;
    /// falls back to a fresh handoff read if nothing was consumed yet.
    pub async fn retry(&self) -> ReaderScreen {
        *self.state.lock() = ReaderState::Loading;
        let has_book = self.current.lock().is_some();
        if has_book {
            self.open_current().await
        } else {
            self.start().await
        }
    }

    pub fn state(&self) -> ReaderState {
        *self.state.lock()
    }

    pub fn highlights(&self) -> &Arc<HighlightLog> {
        &self.highlights
    }

    /// The live viewer session, once `Viewing`
    pub fn session(&self) -> Option<Arc<dyn ViewerSession>> {
        self.session.lock().clone()
    }

    /// Page-input passthrough to the viewer
    pub fn goto_page(&self, page: u32) {
        if let Some(session) = self.session() {
            session.goto_page(page);
        }
    }

    async fn open_current(&self) -> ReaderScreen {
        let Some(resolved) = self.current.lock().clone() else {
            *self.state.lock() = ReaderState::Error;
            return ReaderScreen::NoBookSelected {
                message: NO_BOOK_MESSAGE.to_string(),
                redirect: Navigation::Library,
            };
        };

        let request = ViewRequest {
            source: resolved.source.clone(),
            file_name: resolved.record.name.clone(),
        };

        match self.viewer.open(request).await {
            Ok(session) => {
                // Re-wire the highlight feed; an earlier registration
                // from a failed attempt must not linger.
                if let Some(old) = self.annotation_sub.lock().take() {
                    old.unsubscribe();
                }
                let highlights = Arc::clone(&self.highlights);
                let sub = session.on_annotation(Box::new(move |event| {
                    highlights.add(event.page, event.text.clone());
                }));
                *self.annotation_sub.lock() = Some(sub);
                *self.session.lock() = Some(session);
                *self.state.lock() = ReaderState::Viewing;

                tracing::info!(id = %resolved.record.id, name = %resolved.record.name, "Reader viewing");
                ReaderScreen::Viewing {
                    title: resolved.record.display_title(),
                }
            }
            Err(e) => {
                tracing::error!(name = %resolved.record.name, "Viewer failed to load: {e}");
                *self.state.lock() = ReaderState::Error;
                ReaderScreen::Error {
                    message: format!("Error loading PDF: {e}"),
                    retry_available: true,
                    return_to: Navigation::Library,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{encode_durable, BookRecord, HandleRegistry};
    use crate::error::AppError;
    use crate::error::Result;
    use crate::reader::viewer::{EmbeddedSession, EmbeddedViewer};
    use crate::reader::AnnotationEvent;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn channel() -> Arc<HandoffChannel> {
        Arc::new(HandoffChannel::new(
            Arc::new(MemoryStore::new()),
            Arc::new(HandleRegistry::new()),
        ))
    }

    async fn publish_pdf(channel: &HandoffChannel, name: &str, bytes: &[u8]) -> BookRecord {
        let mut record = BookRecord::new(name, Some(bytes.len() as u64));
        record.durable = Some(encode_durable(bytes));
        channel.publish(&record).await.unwrap();
        record
    }

    /// Viewer wrapper that remembers the concrete session
    struct CapturingViewer {
        inner: EmbeddedViewer,
        last: Mutex<Option<Arc<EmbeddedSession>>>,
    }

    #[async_trait]
    impl DocumentViewer for CapturingViewer {
        async fn open(&self, request: ViewRequest) -> Result<Arc<dyn ViewerSession>> {
            let session = self.inner.open_embedded(request).await?;
            *self.last.lock() = Some(session.clone());
            Ok(session)
        }
    }

    /// Viewer that fails once, then delegates
    struct FlakyViewer {
        inner: EmbeddedViewer,
        fail_next: AtomicBool,
    }

    #[async_trait]
    impl DocumentViewer for FlakyViewer {
        async fn open(&self, request: ViewRequest) -> Result<Arc<dyn ViewerSession>> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(AppError::ViewerInit("widget failed to load".to_string()));
            }
            self.inner.open(request).await
        }
    }

    #[tokio::test]
    async fn test_no_book_selected_redirects() {
        let reader = ReaderBootstrap::new(
            channel(),
            Arc::new(EmbeddedViewer::new()),
            Arc::new(HighlightLog::new()),
        );

        match reader.start().await {
            ReaderScreen::NoBookSelected { redirect, .. } => {
                assert_eq!(redirect, Navigation::Library);
            }
            other => panic!("expected no-book screen, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_happy_path_reaches_viewing() {
        let channel = channel();
        publish_pdf(&channel, "My Book.pdf", b"%PDF-1.4 content").await;

        let reader = ReaderBootstrap::new(
            channel,
            Arc::new(EmbeddedViewer::new()),
            Arc::new(HighlightLog::new()),
        );

        match reader.start().await {
            ReaderScreen::Viewing { title } => assert_eq!(title, "My Book"),
            other => panic!("expected viewing, got {other:?}"),
        }
        assert_eq!(reader.state(), ReaderState::Viewing);

        reader.goto_page(4);
        assert_eq!(reader.session().unwrap().current_page(), 4);
    }

    #[tokio::test]
    async fn test_malformed_durable_renders_viewer_error() {
        let channel = channel();
        let mut record = BookRecord::new("broken.pdf", None);
        record.durable = Some("data:application/pdf;base64,@@not-base64@@".to_string());
        channel.publish(&record).await.unwrap();

        let reader = ReaderBootstrap::new(
            channel,
            Arc::new(EmbeddedViewer::new()),
            Arc::new(HighlightLog::new()),
        );

        match reader.start().await {
            ReaderScreen::Error {
                retry_available,
                return_to,
                ..
            } => {
                assert!(retry_available);
                assert_eq!(return_to, Navigation::Library);
            }
            other => panic!("expected error screen, got {other:?}"),
        }
        assert_eq!(reader.state(), ReaderState::Error);
    }

    #[tokio::test]
    async fn test_retry_recovers_without_a_second_handoff() {
        let channel = channel();
        publish_pdf(&channel, "a.pdf", b"%PDF-1.4").await;

        let reader = ReaderBootstrap::new(
            channel,
            Arc::new(FlakyViewer {
                inner: EmbeddedViewer::new(),
                fail_next: AtomicBool::new(true),
            }),
            Arc::new(HighlightLog::new()),
        );

        assert!(matches!(reader.start().await, ReaderScreen::Error { .. }));
        assert_eq!(reader.state(), ReaderState::Error);

        // The handoff was already consumed; retry must not need it again
        assert!(matches!(reader.retry().await, ReaderScreen::Viewing { .. }));
        assert_eq!(reader.state(), ReaderState::Viewing);
    }

    #[tokio::test]
    async fn test_upload_open_read_flow() {
        use crate::library::{LibraryStore, LibraryView};

        let handles = Arc::new(HandleRegistry::new());
        let store = Arc::new(LibraryStore::new(
            Arc::new(MemoryStore::new()),
            handles.clone(),
        ));
        let handoff = Arc::new(HandoffChannel::new(Arc::new(MemoryStore::new()), handles));
        let shelf = LibraryView::new(store.clone(), handoff.clone());

        shelf
            .upload("Dune.pdf", "application/pdf", b"%PDF-1.4 dune".to_vec())
            .await
            .unwrap();
        let id = store.load().await[0].id.clone();
        assert_eq!(shelf.open(&id).await.unwrap(), Navigation::Reader);

        let reader = ReaderBootstrap::new(
            handoff,
            Arc::new(EmbeddedViewer::new()),
            Arc::new(HighlightLog::new()),
        );
        match reader.start().await {
            ReaderScreen::Viewing { title } => assert_eq!(title, "Dune"),
            other => panic!("expected viewing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_annotations_feed_the_highlight_log() {
        let channel = channel();
        publish_pdf(&channel, "a.pdf", b"%PDF-1.4").await;

        let viewer = Arc::new(CapturingViewer {
            inner: EmbeddedViewer::new(),
            last: Mutex::new(None),
        });
        let highlights = Arc::new(HighlightLog::new());
        let reader = ReaderBootstrap::new(channel, viewer.clone(), highlights.clone());

        assert!(matches!(reader.start().await, ReaderScreen::Viewing { .. }));

        let session = viewer.last.lock().clone().unwrap();
        session.emit_annotation(AnnotationEvent {
            page: 2,
            text: "a memorable passage".to_string(),
        });

        let snapshot = highlights.snapshot();
        assert_eq!(snapshot[&2], vec!["a memorable passage"]);
    }
}
