use model::progress::MigrationProgress;
use serde::Serialize;
use std::{fmt, time::Duration};

/// Counters for one invocation of a family migration.
///
/// `created`, `skipped` and `errors` cover this invocation only; `totals`
/// is the cumulative progress including earlier runs that were resumed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub family: &'static str,
    pub batches: u64,
    pub processed: u64,
    pub created: u64,
    pub skipped: u64,
    pub errors: u64,
    pub degraded: u64,
    pub dependent_failures: u64,
    pub elapsed: Duration,
    pub totals: MigrationProgress,
}

impl RunSummary {
    pub fn new(family: &'static str, totals: MigrationProgress) -> Self {
        Self {
            family,
            batches: 0,
            processed: 0,
            created: 0,
            skipped: 0,
            errors: 0,
            degraded: 0,
            dependent_failures: 0,
            elapsed: Duration::ZERO,
            totals,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Completed,
    Paused,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => f.write_str("COMPLETED"),
            RunStatus::Paused => f.write_str("PAUSED"),
        }
    }
}

/// Non-failing terminal state of a family run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Source exhausted; checkpoint cleared.
    Completed(RunSummary),
    /// Shutdown honored; checkpoint retained for the next run.
    Paused(RunSummary),
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        match self {
            RunOutcome::Completed(_) => RunStatus::Completed,
            RunOutcome::Paused(_) => RunStatus::Paused,
        }
    }

    pub fn summary(&self) -> &RunSummary {
        match self {
            RunOutcome::Completed(summary) | RunOutcome::Paused(summary) => summary,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

/// Stored state of a family as shown by the `progress` command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub family: &'static str,
    /// `None` when no run is in flight (never started or completed).
    pub checkpoint: Option<MigrationProgress>,
    pub mapped: usize,
}
