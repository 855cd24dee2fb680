use crate::{
    error::MigrationError,
    execution::{
        settings::{ExecutorSettings, WriteErrorPolicy},
        summary::{RunOutcome, RunSummary},
    },
};
use engine_core::{
    connectors::{source::SourceStore, target::TargetStore},
    shutdown::ShutdownHandle,
    state::identity::IdentityMap,
};
use engine_processing::{
    consumer::writer::ChunkedWriter,
    family::RecordFamily,
    producer::{filter::ExistenceFilter, reader::CursorReader},
    state_manager::StateManager,
    transform::Transformed,
};
use model::{
    pagination::cursor::Cursor,
    progress::{BatchCounts, MigrationProgress},
    records::{SourceRecord, TargetRecord},
};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Drives one family from its checkpoint to exhaustion or shutdown:
/// read, filter, transform, write, checkpoint, repeat.
pub struct MigrationExecutor<'a, F: RecordFamily> {
    family: &'a F,
    source: &'a dyn SourceStore<F::Source>,
    target: &'a dyn TargetStore<F::Target>,
    /// Identity map of the family this one depends on, read only.
    dependencies: Option<&'a IdentityMap>,
    state: StateManager,
    settings: ExecutorSettings,
    shutdown: ShutdownHandle,
}

/// Result of processing one non-empty batch.
struct BatchResult {
    counts: BatchCounts,
    degraded: u64,
    dependent_failures: u64,
}

impl<'a, F: RecordFamily> MigrationExecutor<'a, F> {
    pub fn new(
        family: &'a F,
        source: &'a dyn SourceStore<F::Source>,
        target: &'a dyn TargetStore<F::Target>,
        state: StateManager,
        settings: ExecutorSettings,
        shutdown: ShutdownHandle,
    ) -> Self {
        Self {
            family,
            source,
            target,
            dependencies: None,
            state,
            settings,
            shutdown,
        }
    }

    pub fn with_dependencies(mut self, dependencies: &'a IdentityMap) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    pub async fn run(mut self) -> Result<RunOutcome, MigrationError> {
        let start = Instant::now();
        let name = self.family.name();
        let mut progress = self.state.resume().await?;
        let mut summary = RunSummary::new(name, progress.clone());

        let reader = CursorReader::new(self.source, self.settings.batch_size);
        let cancel = self.shutdown.cancel_token();

        info!(
            family = name,
            batch_size = self.settings.batch_size,
            chunk_size = self.settings.chunk_size,
            on_write_error = %self.settings.on_write_error,
            "Starting migration"
        );

        loop {
            if self.shutdown.is_requested() {
                return self.pause(progress, summary, start).await;
            }

            // Nothing has been written for this batch yet, so an abandoned
            // read loses nothing.
            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                page = reader.next_batch(progress.cursor.as_ref()) => Some(page),
            };
            let Some(page) = page else {
                return self.pause(progress, summary, start).await;
            };

            let batch = page?;
            let Some(last) = batch.last().map(SourceRecord::cursor) else {
                break;
            };

            let number = summary.batches + 1;
            let result = self.process_batch(number, batch).await?;

            if !progress.advance(last.clone(), result.counts) {
                return Err(MigrationError::CheckpointRejected {
                    family: name,
                    cursor: last,
                });
            }
            self.state.commit(&progress).await?;

            summary.batches = number;
            summary.processed += result.counts.fetched;
            summary.created += result.counts.created;
            summary.skipped += result.counts.skipped;
            summary.errors += result.counts.errors;
            summary.degraded += result.degraded;
            summary.dependent_failures += result.dependent_failures;

            info!(
                family = name,
                batch = number,
                rows = result.counts.fetched,
                created = result.counts.created,
                skipped = result.counts.skipped,
                errors = result.counts.errors,
                total = progress.total_processed,
                cursor = %last,
                "Batch committed"
            );
        }

        self.state.complete().await?;
        summary.elapsed = start.elapsed();
        summary.totals = progress;

        info!(
            family = name,
            batches = summary.batches,
            created = summary.created,
            skipped = summary.skipped,
            errors = summary.errors,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Migration completed"
        );
        Ok(RunOutcome::Completed(summary))
    }

    async fn process_batch(
        &mut self,
        number: u64,
        batch: Vec<F::Source>,
    ) -> Result<BatchResult, MigrationError> {
        let name = self.family.name();
        let fetched = batch.len() as u64;
        let filter = ExistenceFilter::new(self.family, self.target, self.dependencies);

        let screened = filter.screen(batch, self.state.identities());
        let screened_out = screened.skipped.total();

        let outcome = match filter.resolve(screened, self.state.identities()).await {
            Ok(outcome) => outcome,
            Err(source) => {
                error!(family = name, batch = number, error = %source, "Existence check failed");
                return match self.settings.on_write_error {
                    WriteErrorPolicy::Skip => Ok(BatchResult {
                        counts: BatchCounts {
                            fetched,
                            skipped: screened_out,
                            errors: fetched - screened_out,
                            ..Default::default()
                        },
                        degraded: 0,
                        dependent_failures: 0,
                    }),
                    WriteErrorPolicy::Halt => Err(MigrationError::ExistenceCheck {
                        family: name,
                        batch: number,
                        source,
                    }),
                };
            }
        };

        for (legacy_id, existing_id) in &outcome.adopted {
            if self.state.identities_mut().insert(legacy_id, existing_id) {
                info!(family = name, legacy_id, existing_id, "Adopted existing target record");
            }
        }

        let skipped = outcome.skipped.total();
        let mut degraded = 0;
        let mut legacy_ids = Vec::with_capacity(outcome.eligible.len());
        let mut rows = Vec::with_capacity(outcome.eligible.len());

        for candidate in &outcome.eligible {
            let new_id = Uuid::new_v4().to_string();
            let transformed = self
                .family
                .transform(&candidate.record, new_id, candidate.owner.as_deref());
            if let Transformed::Degraded { reason, .. } = &transformed {
                warn!(family = name, id = candidate.record.id(), reason, "Record degraded to defaults");
                degraded += 1;
            }
            legacy_ids.push(candidate.record.id().to_string());
            rows.push(transformed.into_record());
        }

        let writer = ChunkedWriter::new(self.target, self.settings.chunk_size);
        let (committed, dependent_failures) = match writer.write(&rows).await {
            Ok(report) => {
                self.record_mappings(&legacy_ids, &rows);
                (report.written, report.dependent_failures as u64)
            }
            Err(err) => {
                error!(
                    family = name,
                    batch = number,
                    chunk = err.chunk,
                    committed = err.committed,
                    failed = rows.len() - err.committed,
                    error = %err.source,
                    "Batch write failed"
                );
                self.record_mappings(&legacy_ids[..err.committed], &rows[..err.committed]);

                if self.settings.on_write_error == WriteErrorPolicy::Halt {
                    // Keep the committed rows' mappings; the cursor stays.
                    self.state.identities_mut().persist().await?;
                    return Err(MigrationError::WriteHalted {
                        family: name,
                        batch: number,
                        source: err,
                    });
                }
                (err.committed, 0)
            }
        };

        let created = committed as u64;
        Ok(BatchResult {
            counts: BatchCounts {
                fetched,
                created,
                skipped,
                errors: rows.len() as u64 - created,
            },
            degraded,
            dependent_failures,
        })
    }

    fn record_mappings(&mut self, legacy_ids: &[String], rows: &[F::Target]) {
        let identities = self.state.identities_mut();
        for (legacy_id, row) in legacy_ids.iter().zip(rows) {
            identities.insert(legacy_id.as_str(), row.id());
        }
    }

    /// Persists the last committed progress and identity map and exits.
    async fn pause(
        mut self,
        progress: MigrationProgress,
        mut summary: RunSummary,
        start: Instant,
    ) -> Result<RunOutcome, MigrationError> {
        self.shutdown.begin_flush();
        self.state.commit(&progress).await?;
        self.shutdown.mark_exited();

        summary.elapsed = start.elapsed();
        summary.totals = progress;
        info!(
            family = self.family.name(),
            batches = summary.batches,
            cursor = ?summary.totals.cursor.as_ref().map(Cursor::to_string),
            "Shutdown honored, progress saved"
        );
        Ok(RunOutcome::Paused(summary))
    }
}
