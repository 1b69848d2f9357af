//! Batch metadata fetch.
//!
//! Sends discovered ids to the bulk lookup in order, one batch at a time, and folds every
//! returned record into the running aggregates and the CSV report. A failed lookup ends
//! the run; nothing is retried.

use querytrail_error::{ErrorCode, ErrorContext, QueryTrailError, Result};
use std::io::Write;
use tracing::{debug, warn};

use crate::batch::batches;
use crate::report::ReportWriter;
use crate::service::{QueryService, ServiceError};
use crate::stats::RunningStats;

/// Counters for one processed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub index: usize,
    pub requested: usize,
    pub returned: usize,
    pub unprocessed: usize,
    pub written: usize,
}

/// Look up one batch of ids and record the results.
pub async fn fetch_batch<S, W>(
    service: &S,
    index: usize,
    ids: &[String],
    stats: &mut RunningStats,
    report: &mut ReportWriter<W>,
) -> Result<BatchReport>
where
    S: QueryService + ?Sized,
    W: Write,
{
    let output = service.batch_get_executions(ids).await.map_err(|e| {
        let code = match e {
            ServiceError::MalformedResponse { .. } => ErrorCode::MalformedExecution,
            ServiceError::Request { .. } => ErrorCode::BatchFetchFailed,
        };
        QueryTrailError::new(code, e.to_string()).with_context(
            ErrorContext::Batch {
                batch_index: index,
                batch_size: ids.len(),
                first_id: ids.first().cloned(),
            },
        )
    })?;
    debug!(
        "len(batch)={} len(output)={}",
        ids.len(),
        output.records.len()
    );

    for unprocessed in &output.unprocessed {
        warn!(
            "Execution {} was not processed: {} {}",
            unprocessed.execution_id.as_deref().unwrap_or("<unknown>"),
            unprocessed.error_code.as_deref().unwrap_or_default(),
            unprocessed.message.as_deref().unwrap_or_default()
        );
    }

    let mut written = 0;
    for record in &output.records {
        let observation = stats.observe(record.scanned_for_totals());
        if report.write(record, &observation) {
            written += 1;
        }
        debug!(
            execution_id = %record.execution_id,
            state = record.state.as_deref().unwrap_or_default(),
            workgroup = record.workgroup.as_deref().unwrap_or_default(),
            scanned = observation.scanned_bytes,
            "Recorded execution"
        );
    }

    Ok(BatchReport {
        index,
        requested: ids.len(),
        returned: output.records.len(),
        unprocessed: output.unprocessed.len(),
        written,
    })
}

/// Fetch every id in batches of `batch_size`, calling `on_batch` after each one.
pub async fn fetch_all<S, W, F>(
    service: &S,
    ids: &[String],
    batch_size: usize,
    stats: &mut RunningStats,
    report: &mut ReportWriter<W>,
    mut on_batch: F,
) -> Result<()>
where
    S: QueryService + ?Sized,
    W: Write,
    F: FnMut(&BatchReport),
{
    for (index, batch) in batches(ids, batch_size).enumerate() {
        let batch_report = fetch_batch(service, index, batch, stats, report).await?;
        on_batch(&batch_report);
    }
    Ok(())
}
