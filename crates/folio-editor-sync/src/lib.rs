//! Document sessions for folio.
//!
//! This crate provides:
//! - `Document`: the post/page aggregate and its stored form
//! - `EditorSession`: an open document with debounced auto-save
//! - Publishing as one promote-and-delete transaction
//! - Listings that merge drafts over published copies

mod autosave;
mod document;
mod error;
mod listing;
mod publish;
mod session;

pub use autosave::SyncStatus;
pub use document::{Access, Document, DocumentKind, Reference, read_body};
pub use error::{SyncError, ValidationError};
pub use listing::{DocumentStatus, DocumentSummary, list_documents};
pub use publish::{publish_document, publish_transaction};
pub use session::{EditorSession, SessionOptions};
