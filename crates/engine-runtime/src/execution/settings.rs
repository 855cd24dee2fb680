use std::{fmt, str::FromStr};

pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// What the orchestrator does with a batch whose existence check or write
/// failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteErrorPolicy {
    /// Count the uncommitted rows as errors and advance past the batch.
    #[default]
    Skip,
    /// Keep the cursor where it was and fail the run.
    Halt,
}

impl FromStr for WriteErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(WriteErrorPolicy::Skip),
            "halt" => Ok(WriteErrorPolicy::Halt),
            other => Err(format!("unknown write error policy '{other}' (expected skip or halt)")),
        }
    }
}

impl fmt::Display for WriteErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteErrorPolicy::Skip => f.write_str("skip"),
            WriteErrorPolicy::Halt => f.write_str("halt"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorSettings {
    pub batch_size: usize,
    pub chunk_size: usize,
    pub on_write_error: WriteErrorPolicy,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            on_write_error: WriteErrorPolicy::default(),
        }
    }
}
