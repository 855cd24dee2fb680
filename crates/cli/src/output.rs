use crate::error::CliError;
use engine_runtime::execution::summary::{ProgressReport, RunOutcome};

pub fn print_summary(outcomes: &[RunOutcome]) {
    for outcome in outcomes {
        let summary = outcome.summary();
        println!("Migration of '{}': {}", summary.family, outcome.status());
        println!("-----------------------------");
        println!("{:<18} {}", "Batches", summary.batches);
        println!("{:<18} {}", "Created", summary.created);
        println!("{:<18} {}", "Skipped", summary.skipped);
        println!("{:<18} {}", "Errored", summary.errors);
        println!("{:<18} {}", "Processed", summary.processed);
        if summary.degraded > 0 {
            println!("{:<18} {}", "Degraded", summary.degraded);
        }
        if summary.dependent_failures > 0 {
            println!("{:<18} {}", "Dependents failed", summary.dependent_failures);
        }
        println!("{:<18} {}", "Total processed", summary.totals.total_processed);
        println!("{:<18} {:.2}s", "Elapsed", summary.elapsed.as_secs_f64());
        println!();
    }
}

pub fn print_progress(reports: &[ProgressReport], as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    for report in reports {
        println!("Progress for '{}':", report.family);
        println!("-----------------------------");
        println!("{:<16} {}", "Mapped ids", report.mapped);
        match &report.checkpoint {
            Some(progress) => {
                let cursor = progress
                    .cursor
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "n/a".to_string());
                println!("{:<16} {}", "Cursor", cursor);
                println!("{:<16} {}", "Created", progress.created_count);
                println!("{:<16} {}", "Skipped", progress.skipped_count);
                println!("{:<16} {}", "Errored", progress.error_count);
                println!("{:<16} {}", "Processed", progress.total_processed);
                println!("{:<16} {}", "Last updated", progress.last_updated.to_rfc3339());
            }
            None => println!("{:<16} none (not started or completed)", "Checkpoint"),
        }
        println!();
    }
    Ok(())
}
