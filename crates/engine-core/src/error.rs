use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by source and target store adapters.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The connection could not be established or was lost.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// A row came back in a shape the adapter could not decode.
    #[error("Failed to decode row: {0}")]
    Decode(String),

    /// The store rejected a write (constraint violation, oversized message, ...).
    #[error("Write rejected: {0}")]
    Write(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

/// Errors raised while loading or persisting checkpoint and identity state.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint file {path} is corrupt: {source}")]
    CorruptCheckpoint {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Identity map file {path} is corrupt: {source}")]
    CorruptIdentityMap {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
