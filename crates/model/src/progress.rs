use crate::pagination::cursor::Cursor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted progress of one record family.
///
/// The on-disk shape is a camelCase JSON object so operators can inspect and
/// hand-edit a checkpoint during remediation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MigrationProgress {
    /// Key of the last source row advanced past; `None` before the first batch.
    pub cursor: Option<Cursor>,
    pub created_count: u64,
    pub skipped_count: u64,
    pub error_count: u64,
    pub total_processed: u64,
    pub last_updated: DateTime<Utc>,
}

/// Counters produced by processing a single batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounts {
    pub fetched: u64,
    pub created: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl Default for MigrationProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationProgress {
    pub fn new() -> Self {
        MigrationProgress {
            cursor: None,
            created_count: 0,
            skipped_count: 0,
            error_count: 0,
            total_processed: 0,
            last_updated: Utc::now(),
        }
    }

    /// Folds a finished batch into the running totals and moves the cursor to
    /// the batch's last row.
    ///
    /// Returns `false` and leaves the progress untouched if `next` does not
    /// sort strictly below the current cursor.
    pub fn advance(&mut self, next: Cursor, counts: BatchCounts) -> bool {
        if let Some(current) = &self.cursor
            && !current.precedes(&next)
        {
            return false;
        }

        self.cursor = Some(next);
        self.created_count += counts.created;
        self.skipped_count += counts.skipped;
        self.error_count += counts.errors;
        self.total_processed += counts.fetched;
        self.last_updated = Utc::now();
        true
    }

    pub fn is_fresh(&self) -> bool {
        self.cursor.is_none() && self.total_processed == 0
    }
}
