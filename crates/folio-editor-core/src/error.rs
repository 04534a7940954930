//! Error types for the editor core.

use thiserror::Error;

/// A block type tag that no component kind answers to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown block type: {0}")]
pub struct UnknownComponentKind(pub String);
