use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

/// Composite pagination cursor over `(createdAt, id)`.
///
/// Sources are read newest-first, so the next page is everything strictly
/// below the cursor under tuple ordering. The `id` tie-break is what makes the
/// ordering total: `createdAt` alone is not unique.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub timestamp: DateTime<Utc>,
    pub id: String,
}

impl Cursor {
    pub fn new(timestamp: DateTime<Utc>, id: impl Into<String>) -> Self {
        Cursor {
            timestamp,
            id: id.into(),
        }
    }

    /// True when `other` sorts strictly after `self` in read order,
    /// i.e. `(other.timestamp, other.id) < (self.timestamp, self.id)`.
    pub fn precedes(&self, other: &Cursor) -> bool {
        other < self
    }
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.id.as_bytes().cmp(other.id.as_bytes()))
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.timestamp.to_rfc3339(), self.id)
    }
}
