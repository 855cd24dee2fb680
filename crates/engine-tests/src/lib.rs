#![allow(dead_code)]

use engine_core::{shutdown::ShutdownHandle, state::identity::IdentityMap};
use engine_runtime::{
    error::MigrationError,
    execution::{
        layout::StateLayout,
        runner::{MigrationRunner, Selection, Stores},
        settings::ExecutorSettings,
        summary::RunOutcome,
    },
};
use memory::{MemorySource, MemoryTarget};
use model::{
    progress::MigrationProgress,
    records::{
        legacy::{LegacyResume, LegacyUser},
        target::{NewResume, NewUser},
    },
};
use tempfile::TempDir;

pub mod fixtures;
pub mod memory;
#[cfg(test)]
mod scenarios;

/// Both families' stores plus a throwaway state directory.
pub struct Harness {
    pub state: TempDir,
    pub users_source: MemorySource<LegacyUser>,
    pub users_target: MemoryTarget<NewUser>,
    pub resumes_source: MemorySource<LegacyResume>,
    pub resumes_target: MemoryTarget<NewResume>,
}

impl Harness {
    pub fn new(users: Vec<LegacyUser>, resumes: Vec<LegacyResume>) -> Self {
        Self {
            state: TempDir::new().unwrap(),
            users_source: MemorySource::new(users),
            users_target: MemoryTarget::new(),
            resumes_source: MemorySource::new(resumes),
            resumes_target: MemoryTarget::new(),
        }
    }

    pub fn layout(&self) -> StateLayout {
        StateLayout::new(self.state.path())
    }

    pub async fn run(
        &self,
        selection: Selection,
        settings: ExecutorSettings,
        shutdown: ShutdownHandle,
    ) -> Result<Vec<RunOutcome>, MigrationError> {
        let stores = Stores {
            users_source: &self.users_source,
            users_target: &self.users_target,
            resumes_source: &self.resumes_source,
            resumes_target: &self.resumes_target,
        };
        MigrationRunner::new(self.layout(), settings, shutdown)
            .run(selection, &stores)
            .await
    }

    /// Runs one family to its outcome with a fresh shutdown handle.
    pub async fn run_family(
        &self,
        selection: Selection,
        settings: ExecutorSettings,
    ) -> Result<RunOutcome, MigrationError> {
        let mut outcomes = self.run(selection, settings, ShutdownHandle::new()).await?;
        Ok(outcomes.remove(0))
    }

    pub async fn checkpoint(&self, family: &str) -> Option<MigrationProgress> {
        self.layout().checkpoints(family).load().await.unwrap()
    }

    pub async fn identities(&self, family: &str) -> IdentityMap {
        self.layout().identities(family).await.unwrap()
    }
}

pub fn settings(batch_size: usize, chunk_size: usize) -> ExecutorSettings {
    ExecutorSettings {
        batch_size,
        chunk_size,
        ..Default::default()
    }
}
