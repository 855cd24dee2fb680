use crate::pagination::cursor::Cursor;
use chrono::{DateTime, Utc};

pub mod key;
pub mod legacy;
pub mod target;

/// A row read from the legacy store.
pub trait SourceRecord: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    /// Pagination key of this row.
    fn cursor(&self) -> Cursor {
        Cursor::new(self.created_at(), self.id())
    }
}

/// A fully-formed row ready to be inserted into the target store.
pub trait TargetRecord: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}
