use engine_core::{
    error::StateError,
    state::{CheckpointStore, identity::IdentityMap},
};
use model::progress::MigrationProgress;
use std::sync::Arc;
use tracing::{debug, info};

/// Owns the durable state of one family run: its checkpoint and its
/// identity map.
///
/// The identity map is always persisted before the checkpoint. A crash in
/// between leaves extra mappings for rows the checkpoint has not passed yet,
/// which the next run skips; the reverse order could lose mappings for rows
/// already behind the cursor.
pub struct StateManager {
    family: &'static str,
    checkpoints: Arc<dyn CheckpointStore>,
    identities: IdentityMap,
}

impl StateManager {
    pub fn new(
        family: &'static str,
        checkpoints: Arc<dyn CheckpointStore>,
        identities: IdentityMap,
    ) -> Self {
        Self {
            family,
            checkpoints,
            identities,
        }
    }

    /// Progress to continue from; fresh progress when nothing was saved.
    pub async fn resume(&self) -> Result<MigrationProgress, StateError> {
        match self.checkpoints.load().await? {
            Some(progress) => {
                info!(
                    family = self.family,
                    cursor = ?progress.cursor,
                    processed = progress.total_processed,
                    mapped = self.identities.len(),
                    "Resuming from checkpoint"
                );
                Ok(progress)
            }
            None => {
                info!(family = self.family, mapped = self.identities.len(), "No checkpoint, starting fresh");
                Ok(MigrationProgress::new())
            }
        }
    }

    /// Durably records `progress` together with every identity mapping made
    /// so far.
    pub async fn commit(&mut self, progress: &MigrationProgress) -> Result<(), StateError> {
        self.identities.persist().await?;
        self.checkpoints.save(progress).await?;
        debug!(family = self.family, cursor = ?progress.cursor, "State committed");
        Ok(())
    }

    /// Ends a completed run: the mappings stay for dependent families, the
    /// checkpoint goes so the next run starts over from the newest row.
    pub async fn complete(&mut self) -> Result<(), StateError> {
        self.identities.persist().await?;
        self.checkpoints.clear().await?;
        info!(family = self.family, mapped = self.identities.len(), "Checkpoint cleared");
        Ok(())
    }

    pub fn identities(&self) -> &IdentityMap {
        &self.identities
    }

    pub fn identities_mut(&mut self) -> &mut IdentityMap {
        &mut self.identities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use engine_core::state::checkpoint::JsonCheckpointStore;
    use model::{pagination::cursor::Cursor, progress::BatchCounts};
    use tempfile::tempdir;

    fn progressed() -> MigrationProgress {
        let mut progress = MigrationProgress::new();
        progress.advance(
            Cursor::new(Utc::now(), "u1"),
            BatchCounts {
                fetched: 1,
                created: 1,
                skipped: 0,
                errors: 0,
            },
        );
        progress
    }

    #[tokio::test]
    async fn commit_then_resume_round_trips() {
        let dir = tempdir().unwrap();
        let checkpoints = Arc::new(JsonCheckpointStore::new(dir.path().join("users.checkpoint.json")));
        let identities = IdentityMap::load(dir.path().join("users.identity.json")).await.unwrap();

        let mut state = StateManager::new("users", checkpoints.clone(), identities);
        assert!(state.resume().await.unwrap().is_fresh());

        state.identities_mut().insert("u1", "n1");
        let progress = progressed();
        state.commit(&progress).await.unwrap();

        let reloaded = IdentityMap::load(dir.path().join("users.identity.json")).await.unwrap();
        let state = StateManager::new("users", checkpoints, reloaded);
        assert_eq!(state.resume().await.unwrap(), progress);
        assert_eq!(state.identities().get("u1"), Some("n1"));
    }

    #[tokio::test]
    async fn complete_clears_checkpoint_but_keeps_mappings() {
        let dir = tempdir().unwrap();
        let checkpoint_path = dir.path().join("users.checkpoint.json");
        let identity_path = dir.path().join("users.identity.json");
        let checkpoints = Arc::new(JsonCheckpointStore::new(&checkpoint_path));

        let mut state = StateManager::new(
            "users",
            checkpoints,
            IdentityMap::load(&identity_path).await.unwrap(),
        );
        state.identities_mut().insert("u1", "n1");
        state.commit(&progressed()).await.unwrap();
        state.complete().await.unwrap();

        assert!(!checkpoint_path.exists());
        let reloaded = IdentityMap::load(&identity_path).await.unwrap();
        assert_eq!(reloaded.get("u1"), Some("n1"));
    }

    struct Unwritable;

    #[async_trait]
    impl CheckpointStore for Unwritable {
        async fn save(&self, _progress: &MigrationProgress) -> Result<(), StateError> {
            Err(StateError::Write {
                path: "unwritable".into(),
                source: std::io::Error::other("disk full"),
            })
        }

        async fn load(&self) -> Result<Option<MigrationProgress>, StateError> {
            Ok(None)
        }

        async fn clear(&self) -> Result<(), StateError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn identity_map_is_persisted_before_checkpoint() {
        let dir = tempdir().unwrap();
        let identity_path = dir.path().join("users.identity.json");

        let mut state = StateManager::new(
            "users",
            Arc::new(Unwritable),
            IdentityMap::load(&identity_path).await.unwrap(),
        );
        state.identities_mut().insert("u1", "n1");

        assert!(state.commit(&progressed()).await.is_err());
        let reloaded = IdentityMap::load(&identity_path).await.unwrap();
        assert_eq!(reloaded.get("u1"), Some("n1"));
    }
}
