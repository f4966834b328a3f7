//! Library module for book management
//!
//! The persistence store and the shelf view controller.

mod store;
mod view;

pub use store::{LibraryStore, SaveOutcome};
pub use view::{BookCard, LibraryScreen, LibraryView, Navigation};
