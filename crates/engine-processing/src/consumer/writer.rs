use crate::error::ChunkWriteError;
use engine_core::connectors::target::TargetStore;
use model::records::TargetRecord;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReport {
    pub written: usize,
    pub chunks: usize,
    pub dependents_written: usize,
    /// Primary rows whose dependent rows could not be written.
    pub dependent_failures: usize,
    pub duration: Duration,
}

/// Writes transformed rows in bounded chunks, one atomic insert per chunk.
///
/// Chunks are written in order and the first failing chunk stops the batch;
/// the error reports how many rows were committed before it.
pub struct ChunkedWriter<'a, T: TargetRecord> {
    target: &'a dyn TargetStore<T>,
    chunk_size: usize,
}

impl<'a, T: TargetRecord> ChunkedWriter<'a, T> {
    pub fn new(target: &'a dyn TargetStore<T>, chunk_size: usize) -> Self {
        Self {
            target,
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn write(&self, rows: &[T]) -> Result<WriteReport, ChunkWriteError> {
        let start = Instant::now();
        let mut report = WriteReport::default();

        for (index, chunk) in rows.chunks(self.chunk_size).enumerate() {
            self.target
                .insert(chunk)
                .await
                .map_err(|source| ChunkWriteError {
                    chunk: index,
                    committed: report.written,
                    source,
                })?;
            report.written += chunk.len();
            report.chunks += 1;

            // Dependent rows are best effort once their primary rows exist.
            match self.target.insert_dependents(chunk).await {
                Ok(count) => report.dependents_written += count,
                Err(e) => {
                    warn!(
                        chunk = index,
                        rows = chunk.len(),
                        first_id = chunk.first().map(TargetRecord::id).unwrap_or_default(),
                        error = %e,
                        "Dependent rows not written"
                    );
                    report.dependent_failures += chunk.len();
                }
            }

            debug!(chunk = index, rows = chunk.len(), "Chunk written");
        }

        report.duration = start.elapsed();
        Ok(report)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use engine_core::error::StoreError;
    use model::records::key::NaturalKey;
    use std::{collections::HashMap, sync::Mutex};

    #[derive(Debug, Clone)]
    struct Row(String);

    impl TargetRecord for Row {
        fn id(&self) -> &str {
            &self.0
        }
    }

    #[derive(Default)]
    struct Recording {
        inserted: Mutex<Vec<Vec<String>>>,
        fail_chunk: Option<usize>,
        fail_dependents: bool,
    }

    #[async_trait]
    impl TargetStore<Row> for Recording {
        async fn find_existing(
            &self,
            _keys: &[NaturalKey],
        ) -> Result<HashMap<NaturalKey, String>, StoreError> {
            Ok(HashMap::new())
        }

        async fn insert(&self, rows: &[Row]) -> Result<(), StoreError> {
            let mut inserted = self.inserted.lock().unwrap();
            if self.fail_chunk == Some(inserted.len()) {
                return Err(StoreError::Write("unique violation".into()));
            }
            inserted.push(rows.iter().map(|r| r.0.clone()).collect());
            Ok(())
        }

        async fn insert_dependents(&self, rows: &[Row]) -> Result<usize, StoreError> {
            if self.fail_dependents {
                return Err(StoreError::Write("fk violation".into()));
            }
            Ok(rows.len())
        }
    }

    fn rows(n: usize) -> Vec<Row> {
        (0..n).map(|i| Row(format!("r{i}"))).collect()
    }

    #[tokio::test]
    async fn splits_rows_into_chunks_in_order() {
        let target = Recording::default();
        let writer = ChunkedWriter::new(&target, 2);

        let report = writer.write(&rows(5)).await.unwrap();

        assert_eq!(report.written, 5);
        assert_eq!(report.chunks, 3);
        assert_eq!(report.dependents_written, 5);
        let inserted = target.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 3);
        assert_eq!(inserted[2], vec!["r4".to_string()]);
    }

    #[tokio::test]
    async fn failing_chunk_reports_committed_prefix() {
        let target = Recording {
            fail_chunk: Some(1),
            ..Default::default()
        };
        let writer = ChunkedWriter::new(&target, 2);

        let err = writer.write(&rows(5)).await.unwrap_err();

        assert_eq!(err.chunk, 1);
        assert_eq!(err.committed, 2);
        assert_eq!(target.inserted.lock().unwrap().len(), 1, "later chunks not attempted");
    }

    #[tokio::test]
    async fn dependent_failures_do_not_fail_the_batch() {
        let target = Recording {
            fail_dependents: true,
            ..Default::default()
        };
        let writer = ChunkedWriter::new(&target, 10);

        let report = writer.write(&rows(3)).await.unwrap();

        assert_eq!(report.written, 3);
        assert_eq!(report.dependents_written, 0);
        assert_eq!(report.dependent_failures, 3);
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let target = Recording::default();
        let writer = ChunkedWriter::new(&target, 0);

        let report = writer.write(&[]).await.unwrap();

        assert_eq!(writer.chunk_size(), 1);
        assert_eq!(report.chunks, 0);
        assert!(target.inserted.lock().unwrap().is_empty());
    }
}
