use engine_core::error::StoreError;
use model::pagination::cursor::Cursor;
use thiserror::Error;

/// Fatal errors on the read side. Any of these aborts the run: it is not
/// safe to guess the source position after a failed or inconsistent read.
#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("Fetch failed at cursor {cursor:?}: {source}")]
    Fetch {
        cursor: Option<Cursor>,
        #[source]
        source: StoreError,
    },

    #[error("Source returned row {row} which is not strictly below {bound}")]
    CursorRegression { bound: Cursor, row: Cursor },
}

/// A batch could not be written. Rows before `committed` are in the target.
#[derive(Error, Debug)]
#[error("Chunk {chunk} failed after {committed} committed rows: {source}")]
pub struct ChunkWriteError {
    pub chunk: usize,
    pub committed: usize,
    #[source]
    pub source: StoreError,
}
