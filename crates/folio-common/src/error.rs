//! Error types shared across folio crates.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum StoreError {
    #[error("document {id} not found")]
    #[diagnostic(code(store::not_found))]
    NotFound { id: String },

    #[error("document {id} already exists")]
    #[diagnostic(code(store::conflict))]
    AlreadyExists { id: String },

    #[error("document is missing an `_id` field")]
    #[diagnostic(code(store::missing_id))]
    MissingId,

    #[error("`{name}` cannot be used as a stored name")]
    #[diagnostic(
        code(store::invalid_name),
        help("ids and filenames must be non-empty and free of `/`, `\\` and `..`")
    )]
    InvalidName { name: String },

    #[error("document {id} is not a JSON object")]
    #[diagnostic(code(store::not_an_object))]
    NotAnObject { id: String },

    #[error("store is unavailable: {0}")]
    #[diagnostic(
        code(store::unavailable),
        help("the change is kept locally; saving again retries it")
    )]
    Unavailable(String),

    #[error("failed to access {}", path.display())]
    #[diagnostic(code(store::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(store::serde))]
    Serde(#[from] serde_json::Error),
}

/// Configuration loading errors.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("unsupported config format for {}", path.display())]
    #[diagnostic(code(config::format), help("use a .json or .toml file"))]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read config at {}", path.display())]
    #[diagnostic(code(config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid dataset name `{dataset}`")]
    #[diagnostic(code(config::dataset), help("use a plain name such as `production`"))]
    InvalidDataset { dataset: String },

    #[error("invalid value for {var}: {value}")]
    #[diagnostic(code(config::env))]
    InvalidEnv { var: &'static str, value: String },

    #[error(transparent)]
    #[diagnostic(code(config::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(config::toml_de))]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    #[diagnostic(code(config::toml_ser))]
    TomlSer(#[from] toml::ser::Error),
}
