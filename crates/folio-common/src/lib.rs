//! Shared plumbing for folio: errors, configuration, tracing setup and the
//! document store contract.

pub mod config;
pub mod error;
pub mod store;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use crate::config::Config;
pub use crate::error::{ConfigError, StoreError};
pub use crate::store::{DocumentStore, Object};

// Re-exported so dependents hash snapshots the same way.
pub use blake3;
