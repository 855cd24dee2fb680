use crate::error::ProducerError;
use engine_core::connectors::source::SourceStore;
use model::{pagination::cursor::Cursor, records::SourceRecord};
use tracing::debug;

/// Pages through a source store newest-first using a composite cursor.
pub struct CursorReader<'a, R: SourceRecord> {
    source: &'a dyn SourceStore<R>,
    batch_size: usize,
}

impl<'a, R: SourceRecord> CursorReader<'a, R> {
    pub fn new(source: &'a dyn SourceStore<R>, batch_size: usize) -> Self {
        Self {
            source,
            batch_size: batch_size.max(1),
        }
    }

    /// Fetches the page following `cursor`. An empty page means the source
    /// is exhausted.
    ///
    /// The page is checked to be strictly decreasing and strictly below the
    /// cursor; anything else would make resumption skip or repeat rows.
    pub async fn next_batch(&self, cursor: Option<&Cursor>) -> Result<Vec<R>, ProducerError> {
        let rows = self
            .source
            .fetch_page(cursor, self.batch_size)
            .await
            .map_err(|source| ProducerError::Fetch {
                cursor: cursor.cloned(),
                source,
            })?;

        let mut bound = cursor.cloned();
        for row in &rows {
            let key = row.cursor();
            if let Some(bound) = &bound
                && !bound.precedes(&key)
            {
                return Err(ProducerError::CursorRegression {
                    bound: bound.clone(),
                    row: key,
                });
            }
            bound = Some(key);
        }

        debug!(rows = rows.len(), cursor = ?cursor, "Fetched page");
        Ok(rows)
    }
}
