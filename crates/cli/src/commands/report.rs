//! The report run: discovery, batched metadata fetch, CSV rows, summary.

use anyhow::Result;
use owo_colors::OwoColorize;
use querytrail_core::batch::batch_count;
use querytrail_core::{discover, fetch_all, QueryService, ReportWriter, RunningStats};
use tracing::{info, warn};

use super::helpers::{progress_bar, spinner, ReportResult, RunSettings};
use crate::output::{self, OutputFormat};

/// What a finished run produced.
#[derive(Debug)]
pub struct ReportOutcome {
    pub stats: RunningStats,
    pub rows_written: usize,
    pub rows_failed: usize,
    pub batches: usize,
}

pub async fn report<S>(
    service: &S,
    settings: &RunSettings,
    format: OutputFormat,
) -> Result<ReportOutcome>
where
    S: QueryService + ?Sized,
{
    let mut writer = ReportWriter::create(&settings.output_file, settings.filter)?;
    let result_name = settings.output_file.display().to_string();
    let mut stats = RunningStats::new(&settings.window, result_name, settings.big_threshold);

    let pb = spinner(
        format,
        &format!(
            "Looking up executions from {} to {}...",
            settings.window.from, settings.window.to
        ),
    )?;
    let ids = match discover(service, &settings.warehouse, &settings.window, settings.decode).await
    {
        Ok(ids) => {
            pb.finish_with_message(format!("{} Found {} executions", "✔".green(), ids.len()));
            ids
        }
        Err(e) => {
            pb.finish_with_message(format!("{} Discovery failed", "✘".red()));
            return Err(e.into());
        }
    };

    let batch_size = settings.warehouse.effective_batch_size();
    let batches = batch_count(ids.len(), batch_size);
    let pb = progress_bar(format, batches)?;
    let mut returned = 0;
    fetch_all(
        service,
        &ids,
        batch_size,
        &mut stats,
        &mut writer,
        |batch| {
            returned += batch.returned;
            pb.inc(1);
            pb.set_message(format!("{} records", returned));
        },
    )
    .await?;
    pb.finish_and_clear();

    let rows_written = writer.rows_written();
    let rows_failed = writer.rows_failed();
    writer.finish()?;
    if rows_failed > 0 {
        warn!("{} rows could not be written to {}", rows_failed, settings.output_file.display());
    }
    info!(
        "Wrote {} of {} records to {}",
        rows_written,
        stats.query_count,
        settings.output_file.display()
    );

    if format.is_machine_readable() {
        output::print_success(
            format,
            ReportResult {
                summary: stats.summary(),
                rows_written,
                rows_failed,
                batches,
            },
        )?;
    } else {
        print!("{}", stats);
    }

    Ok(ReportOutcome {
        stats,
        rows_written,
        rows_failed,
        batches,
    })
}
