use crate::error::StoreError;
use async_trait::async_trait;
use model::{pagination::cursor::Cursor, records::SourceRecord};

/// Read side of the legacy store for one record family.
#[async_trait]
pub trait SourceStore<R: SourceRecord>: Send + Sync {
    /// Returns at most `limit` rows ordered by `(created_at DESC, id DESC)`.
    ///
    /// With a cursor, only rows strictly below it under tuple ordering are
    /// returned; without one the page starts at the newest row. Dependent
    /// rows (secrets, statistics) are looked up for the ids of this page only.
    async fn fetch_page(&self, cursor: Option<&Cursor>, limit: usize)
    -> Result<Vec<R>, StoreError>;
}
