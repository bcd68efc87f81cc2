//! Typed error hierarchy for the tracker.
//!
//! The derivation core is total and never fails. Errors only appear at the
//! edges:
//! - `RegistryError`: building or loading a phase registry
//! - `SnapshotError`: reading snapshots from an input stream

use thiserror::Error;

/// Errors raised while building or loading a [`crate::registry::PhaseRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Phase registry must contain at least one phase")]
    Empty,

    #[error("Duplicate phase id '{id}' in registry")]
    DuplicateId { id: String },

    #[error("Phase id '{id}' is reserved for the terminal sentinel")]
    ReservedId { id: String },

    #[error("Phase id must not be empty (position {position})")]
    BlankId { position: usize },

    #[error("Phases '{first}' and '{second}' both declare sub-stages; only one phase may own them")]
    MultipleSubStaged { first: String, second: String },

    #[error("Phase '{id}' declares zero sub-stages")]
    ZeroSubStages { id: String },

    #[error("Failed to read registry file at {path}: {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse registry JSON at {path}: {source}")]
    ParseFailed {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while reading snapshots from an input stream.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Malformed snapshot on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read snapshot input: {0}")]
    ReadFailed(#[source] std::io::Error),
}
