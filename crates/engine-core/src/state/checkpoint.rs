use crate::{
    error::StateError,
    state::{
        CheckpointStore,
        fs::{read_optional, write_atomic},
    },
};
use async_trait::async_trait;
use model::progress::MigrationProgress;
use std::{
    io,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Checkpoint stored as a single pretty-printed JSON file.
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CheckpointStore for JsonCheckpointStore {
    async fn save(&self, progress: &MigrationProgress) -> Result<(), StateError> {
        let bytes = serde_json::to_vec_pretty(progress)?;
        write_atomic(&self.path, &bytes)
            .await
            .map_err(|source| StateError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), cursor = ?progress.cursor, "Checkpoint saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<MigrationProgress>, StateError> {
        let Some(bytes) = read_optional(&self.path)
            .await
            .map_err(|source| StateError::Read {
                path: self.path.clone(),
                source,
            })?
        else {
            return Ok(None);
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StateError::CorruptCheckpoint {
                path: self.path.clone(),
                source,
            })
    }

    async fn clear(&self) -> Result<(), StateError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StateError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
