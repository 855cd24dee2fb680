use crate::execution::summary::ProgressReport;
use engine_core::{
    error::StateError,
    state::{CheckpointStore, checkpoint::JsonCheckpointStore, identity::IdentityMap},
};
use engine_processing::state_manager::StateManager;
use std::{path::PathBuf, sync::Arc};

pub const DEFAULT_STATE_DIR: &str = ".migration";

/// Fixed per-family file names inside the state directory.
#[derive(Debug, Clone)]
pub struct StateLayout {
    dir: PathBuf,
}

impl StateLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn checkpoint_path(&self, family: &str) -> PathBuf {
        self.dir.join(format!("{family}.checkpoint.json"))
    }

    pub fn identity_path(&self, family: &str) -> PathBuf {
        self.dir.join(format!("{family}.identity.json"))
    }

    pub fn checkpoints(&self, family: &str) -> Arc<dyn CheckpointStore> {
        Arc::new(JsonCheckpointStore::new(self.checkpoint_path(family)))
    }

    pub async fn identities(&self, family: &str) -> Result<IdentityMap, StateError> {
        IdentityMap::load(self.identity_path(family)).await
    }

    /// Loads the family's identity map and wires it to its checkpoint file.
    pub async fn open(&self, family: &'static str) -> Result<StateManager, StateError> {
        let identities = self.identities(family).await?;
        Ok(StateManager::new(family, self.checkpoints(family), identities))
    }

    pub async fn progress(&self, family: &'static str) -> Result<ProgressReport, StateError> {
        let checkpoint = self.checkpoints(family).load().await?;
        let mapped = self.identities(family).await?.len();
        Ok(ProgressReport {
            family,
            checkpoint,
            mapped,
        })
    }
}
