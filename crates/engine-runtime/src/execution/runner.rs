use crate::{
    error::MigrationError,
    execution::{
        executor::MigrationExecutor,
        layout::StateLayout,
        settings::ExecutorSettings,
        summary::{ProgressReport, RunOutcome},
    },
};
use engine_core::{
    connectors::{source::SourceStore, target::TargetStore},
    error::StateError,
    shutdown::ShutdownHandle,
};
use engine_processing::family::{RecordFamily, ResumeFamily, UserFamily};
use model::records::{
    legacy::{LegacyResume, LegacyUser},
    target::{NewResume, NewUser},
};
use std::{fmt, str::FromStr};
use tracing::{info, warn};

/// Which families a `migrate` invocation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Users,
    Resumes,
    /// Users, then resumes if the users run completed.
    All,
}

impl FromStr for Selection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(Selection::Users),
            "resumes" => Ok(Selection::Resumes),
            "all" => Ok(Selection::All),
            other => Err(format!("unknown family '{other}'")),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Users => f.write_str("users"),
            Selection::Resumes => f.write_str("resumes"),
            Selection::All => f.write_str("all"),
        }
    }
}

/// Source and target stores for both families.
pub struct Stores<'a> {
    pub users_source: &'a dyn SourceStore<LegacyUser>,
    pub users_target: &'a dyn TargetStore<NewUser>,
    pub resumes_source: &'a dyn SourceStore<LegacyResume>,
    pub resumes_target: &'a dyn TargetStore<NewResume>,
}

/// Runs family migrations in dependency order against one state directory.
pub struct MigrationRunner {
    layout: StateLayout,
    settings: ExecutorSettings,
    shutdown: ShutdownHandle,
    users: UserFamily,
    resumes: ResumeFamily,
}

impl MigrationRunner {
    pub fn new(layout: StateLayout, settings: ExecutorSettings, shutdown: ShutdownHandle) -> Self {
        Self {
            layout,
            settings,
            shutdown,
            users: UserFamily,
            resumes: ResumeFamily::default(),
        }
    }

    /// Returns one outcome per family that was started.
    pub async fn run(
        &self,
        selection: Selection,
        stores: &Stores<'_>,
    ) -> Result<Vec<RunOutcome>, MigrationError> {
        match selection {
            Selection::Users => Ok(vec![self.run_users(stores).await?]),
            Selection::Resumes => Ok(vec![self.run_resumes(stores).await?]),
            Selection::All => {
                let users = self.run_users(stores).await?;
                if !users.is_completed() {
                    info!("User migration paused, not starting resumes");
                    return Ok(vec![users]);
                }
                let resumes = self.run_resumes(stores).await?;
                Ok(vec![users, resumes])
            }
        }
    }

    pub async fn run_users(&self, stores: &Stores<'_>) -> Result<RunOutcome, MigrationError> {
        let state = self.layout.open(self.users.name()).await?;
        MigrationExecutor::new(
            &self.users,
            stores.users_source,
            stores.users_target,
            state,
            self.settings,
            self.shutdown.clone(),
        )
        .run()
        .await
    }

    /// Resumes resolve their owners through the user identity map, which is
    /// loaded once and never written by this run.
    pub async fn run_resumes(&self, stores: &Stores<'_>) -> Result<RunOutcome, MigrationError> {
        let users = self.layout.identities(self.users.name()).await?;
        if users.is_empty() {
            warn!("User identity map is empty, every resume will be skipped");
        }

        let state = self.layout.open(self.resumes.name()).await?;
        MigrationExecutor::new(
            &self.resumes,
            stores.resumes_source,
            stores.resumes_target,
            state,
            self.settings,
            self.shutdown.clone(),
        )
        .with_dependencies(&users)
        .run()
        .await
    }

    pub async fn progress(&self, selection: Selection) -> Result<Vec<ProgressReport>, StateError> {
        let families = match selection {
            Selection::Users => vec![self.users.name()],
            Selection::Resumes => vec![self.resumes.name()],
            Selection::All => vec![self.users.name(), self.resumes.name()],
        };

        let mut reports = Vec::with_capacity(families.len());
        for family in families {
            reports.push(self.layout.progress(family).await?);
        }
        Ok(reports)
    }
}
