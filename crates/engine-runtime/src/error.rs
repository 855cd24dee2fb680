use engine_core::error::{StateError, StoreError};
use engine_processing::error::{ChunkWriteError, ProducerError};
use model::pagination::cursor::Cursor;
use thiserror::Error;

/// Errors that end a migration run as FAILED. The checkpoint on disk is left
/// as it was after the last committed batch.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Source read failed or returned rows out of order.
    #[error("Read error: {0}")]
    Producer(#[from] ProducerError),

    /// Checkpoint or identity map could not be read or written.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Existence check failed while the write policy is `halt`.
    #[error("Batch {batch} of {family} failed during existence check: {source}")]
    ExistenceCheck {
        family: &'static str,
        batch: u64,
        #[source]
        source: StoreError,
    },

    /// Chunk write failed while the write policy is `halt`.
    #[error("Batch {batch} of {family} failed to write: {source}")]
    WriteHalted {
        family: &'static str,
        batch: u64,
        #[source]
        source: ChunkWriteError,
    },

    #[error("Checkpoint for {family} refused to move to {cursor}")]
    CheckpointRejected { family: &'static str, cursor: Cursor },
}
