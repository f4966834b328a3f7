//! Embedded viewer seam
//!
//! The third-party widget is opaque to the rest of the system: it takes a
//! byte source and a display name, renders pages, and reports annotation
//! events. The trait pair here is that boundary; the widget's native
//! callback registration is modeled as a subscription that can be
//! cancelled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::book::ViewSource;
use crate::error::{AppError, Result};

/// An annotation reported by the viewer (a highlight on a page)
#[derive(Debug, Clone)]
pub struct AnnotationEvent {
    pub page: u32,
    pub text: String,
}

pub type AnnotationHandler = Box<dyn Fn(&AnnotationEvent) + Send + Sync>;

/// Cancels an event registration
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// What the viewer is asked to render
#[derive(Debug, Clone)]
pub struct ViewRequest {
    pub source: ViewSource,
    pub file_name: String,
}

/// The opaque document viewer collaborator
#[async_trait]
pub trait DocumentViewer: Send + Sync {
    /// Load a document. Failures surface as [`AppError::ViewerInit`] and
    /// are never fatal to the page.
    async fn open(&self, request: ViewRequest) -> Result<Arc<dyn ViewerSession>>;
}

/// A loaded document inside the viewer
pub trait ViewerSession: Send + Sync {
    fn file_name(&self) -> &str;

    /// Jump to a page. Out-of-range values are clamped by the widget.
    fn goto_page(&self, page: u32);

    fn current_page(&self) -> u32;

    /// Register for annotation events. Dropping the reader must not leave
    /// the widget calling into freed state, hence the explicit
    /// unsubscribe.
    fn on_annotation(&self, handler: AnnotationHandler) -> Subscription;
}

/// Stand-in for the embedded widget
///
/// Validates that the source looks like a PDF and dispatches annotation
/// events pushed through [`EmbeddedSession::emit_annotation`]. Remote URLs
/// are accepted as-is (the real widget fetches them itself); anything
/// else that cannot be byte-checked is rejected.
pub struct EmbeddedViewer;

impl EmbeddedViewer {
    pub fn new() -> Self {
        Self
    }

    /// Concrete-typed open, used where the caller needs to drive
    /// [`EmbeddedSession::emit_annotation`].
    pub async fn open_embedded(&self, request: ViewRequest) -> Result<Arc<EmbeddedSession>> {
        match &request.source {
            ViewSource::Bytes(bytes) => {
                if !bytes.starts_with(b"%PDF") {
                    return Err(AppError::ViewerInit(format!(
                        "'{}' is not a PDF document",
                        request.file_name
                    )));
                }
            }
            ViewSource::Url(url) => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(AppError::ViewerInit(format!(
                        "cannot load '{}' from unsupported URL form",
                        request.file_name
                    )));
                }
            }
        }

        tracing::info!(file = %request.file_name, "Viewer loaded document");
        Ok(Arc::new(EmbeddedSession {
            file_name: request.file_name,
            page: Mutex::new(1),
            handlers: Arc::new(Mutex::new(HashMap::new())),
            next_handler_id: AtomicU64::new(0),
        }))
    }
}

impl Default for EmbeddedViewer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentViewer for EmbeddedViewer {
    async fn open(&self, request: ViewRequest) -> Result<Arc<dyn ViewerSession>> {
        let session: Arc<dyn ViewerSession> = self.open_embedded(request).await?;
        Ok(session)
    }
}

type HandlerMap = Arc<Mutex<HashMap<u64, Arc<AnnotationHandler>>>>;

/// Session state for the stand-in widget
pub struct EmbeddedSession {
    file_name: String,
    page: Mutex<u32>,
    handlers: HandlerMap,
    next_handler_id: AtomicU64,
}

impl EmbeddedSession {
    /// Push an annotation event through the registered handlers, the way
    /// the real widget would on a user highlight.
    pub fn emit_annotation(&self, event: AnnotationEvent) {
        let handlers: Vec<Arc<AnnotationHandler>> =
            self.handlers.lock().values().cloned().collect();
        for handler in handlers {
            handler(&event);
        }
    }
}

impl ViewerSession for EmbeddedSession {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn goto_page(&self, page: u32) {
        *self.page.lock() = page.max(1);
    }

    fn current_page(&self) -> u32 {
        *self.page.lock()
    }

    fn on_annotation(&self, handler: AnnotationHandler) -> Subscription {
        let id = self.next_handler_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().insert(id, Arc::new(handler));

        let handlers = Arc::clone(&self.handlers);
        Subscription::new(move || {
            handlers.lock().remove(&id);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn request(bytes: &[u8]) -> ViewRequest {
        ViewRequest {
            source: ViewSource::Bytes(Arc::new(bytes.to_vec())),
            file_name: "a.pdf".to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_checks_pdf_magic() {
        let viewer = EmbeddedViewer::new();
        let session = viewer.open(request(b"%PDF-1.4 ok")).await.unwrap();
        assert_eq!(session.file_name(), "a.pdf");
        assert_eq!(session.current_page(), 1);

        let err = viewer.open(request(b"not a pdf")).await.err().unwrap();
        assert!(matches!(err, AppError::ViewerInit(_)));
    }

    #[tokio::test]
    async fn test_url_sources() {
        let viewer = EmbeddedViewer::new();
        let ok = ViewRequest {
            source: ViewSource::Url("https://example.com/a.pdf".to_string()),
            file_name: "a.pdf".to_string(),
        };
        assert!(viewer.open(ok).await.is_ok());

        let bad = ViewRequest {
            source: ViewSource::Url("data:application/pdf;base64,@@@".to_string()),
            file_name: "a.pdf".to_string(),
        };
        assert!(matches!(
            viewer.open(bad).await.err(),
            Some(AppError::ViewerInit(_))
        ));
    }

    #[tokio::test]
    async fn test_goto_page_clamps_to_one() {
        let viewer = EmbeddedViewer::new();
        let session = viewer.open(request(b"%PDF-1.4")).await.unwrap();
        session.goto_page(0);
        assert_eq!(session.current_page(), 1);
        session.goto_page(7);
        assert_eq!(session.current_page(), 7);
    }

    #[tokio::test]
    async fn test_annotation_subscription_and_unsubscribe() {
        let viewer = EmbeddedViewer::new();
        let session = viewer.open_embedded(request(b"%PDF-1.4")).await.unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let sub = session.on_annotation(Box::new(move |event| {
            assert_eq!(event.page, 3);
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        session.emit_annotation(AnnotationEvent {
            page: 3,
            text: "highlighted".to_string(),
        });
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        sub.unsubscribe();
        session.emit_annotation(AnnotationEvent {
            page: 3,
            text: "after unsubscribe".to_string(),
        });
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
