pub mod document;
pub mod resume;
pub mod user;

/// Outcome of a total record transformation.
///
/// A degraded record is still migrated; some nested payload was replaced by
/// its default and `reason` says why.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformed<T> {
    Ok(T),
    Degraded { record: T, reason: String },
}

impl<T> Transformed<T> {
    pub fn record(&self) -> &T {
        match self {
            Transformed::Ok(record) | Transformed::Degraded { record, .. } => record,
        }
    }

    pub fn into_record(self) -> T {
        match self {
            Transformed::Ok(record) | Transformed::Degraded { record, .. } => record,
        }
    }

    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Transformed::Ok(_) => None,
            Transformed::Degraded { reason, .. } => Some(reason),
        }
    }
}
