//! Error types for document sessions.

use folio_common::StoreError;
use miette::Diagnostic;
use thiserror::Error;

/// A document is not ready to be saved or published.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Diagnostic)]
pub enum ValidationError {
    #[error("a title is required")]
    #[diagnostic(code(validation::missing_title))]
    MissingTitle,

    #[error("at least one author is required")]
    #[diagnostic(code(validation::missing_author), help("add an author reference before saving"))]
    MissingAuthor,
}

/// Errors that can occur during session operations.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum SyncError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    /// Neither a draft nor a published copy exists.
    #[error("document {id} not found")]
    #[diagnostic(code(sync::not_found))]
    NotFound { id: String },

    /// The stored JSON does not describe a document.
    #[error("document {id} could not be read")]
    #[diagnostic(code(sync::invalid_document))]
    InvalidDocument {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}
