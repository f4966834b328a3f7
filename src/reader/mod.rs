//! Reader view: viewer seam, bootstrap, highlight log

mod bootstrap;
mod highlights;
mod viewer;

pub use bootstrap::{ReaderBootstrap, ReaderScreen, ReaderState};
pub use highlights::HighlightLog;
pub use viewer::{
    AnnotationEvent, AnnotationHandler, DocumentViewer, EmbeddedSession, EmbeddedViewer,
    Subscription, ViewRequest, ViewerSession,
};
