use crate::error::StateError;
use async_trait::async_trait;
use model::progress::MigrationProgress;

pub mod checkpoint;
mod fs;
pub mod identity;

/// Persistence of a family's migration progress.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, progress: &MigrationProgress) -> Result<(), StateError>;

    /// Returns `None` when no run has been checkpointed yet.
    async fn load(&self) -> Result<Option<MigrationProgress>, StateError>;

    /// Removes the checkpoint. Only called after a completed run.
    async fn clear(&self) -> Result<(), StateError>;
}
