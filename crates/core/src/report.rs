//! CSV report of execution records.

use querytrail_error::{ErrorCode, ErrorContext, QueryTrailError, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::error;

use crate::record::ExecutionRecord;
use crate::stats::Observation;
use crate::units::humanize_bytes;

pub const CSV_HEADER: [&str; 8] = [
    "queryExecutionID",
    "Database",
    "SubmissionDateTime",
    "EngineExecutionTimeInMillis",
    "OutputLocation (bucket)",
    "Scanned(humanized)",
    "DataScannedInBytes",
    "Query",
];

/// Which records make it into the CSV. Aggregates always see every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowFilter {
    #[default]
    All,
    /// Only records scanning more than any record before them.
    NewLargest,
    /// Only records scanning more than the big-query threshold.
    AboveThreshold,
}

impl RowFilter {
    pub fn admits(&self, observation: &Observation) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::NewLargest => observation.scanned_bytes > observation.previous_largest,
            RowFilter::AboveThreshold => observation.is_big,
        }
    }
}

/// Bucket name from an `s3://bucket/key` location; empty when there is none.
pub fn output_bucket(location: &str) -> &str {
    location.split('/').nth(2).unwrap_or_default()
}

/// Flatten query text onto one line: `"` becomes `'`, newlines and tabs become spaces.
pub fn normalize_query(query: &str) -> String {
    query
        .chars()
        .map(|c| match c {
            '"' => '\'',
            '\n' | '\t' | '\r' => ' ',
            other => other,
        })
        .collect()
}

pub fn csv_row(record: &ExecutionRecord) -> [String; 8] {
    let scanned = record.scanned_or_missing();
    [
        record.execution_id.clone(),
        record.database.clone().unwrap_or_default(),
        record
            .submitted_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default(),
        record.engine_time_or_missing().to_string(),
        record
            .output_location
            .as_deref()
            .map(output_bucket)
            .unwrap_or_default()
            .to_string(),
        humanize_bytes(scanned),
        scanned.to_string(),
        normalize_query(&record.query),
    ]
}

pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
    filter: RowFilter,
    rows_written: usize,
    rows_failed: usize,
}

impl ReportWriter<File> {
    /// Create (truncate) the report file at `path` and write the header.
    pub fn create(path: &Path, filter: RowFilter) -> Result<Self> {
        let file = File::create(path).map_err(|e| {
            QueryTrailError::new(
                ErrorCode::OutputCreateFailed,
                format!("Can't create file {}: {}", path.display(), e),
            )
            .with_context(ErrorContext::Output {
                path: path.display().to_string(),
            })
        })?;
        Self::new(file, filter)
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(inner: W, filter: RowFilter) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        Ok(Self {
            writer,
            filter,
            rows_written: 0,
            rows_failed: 0,
        })
    }

    /// Write `record` if the filter admits it. A failed row is logged and skipped.
    pub fn write(&mut self, record: &ExecutionRecord, observation: &Observation) -> bool {
        if !self.filter.admits(observation) {
            return false;
        }
        match self.writer.write_record(csv_row(record)) {
            Ok(()) => {
                self.rows_written += 1;
                true
            }
            Err(e) => {
                error!("Can't write row for {}: {}", record.execution_id, e);
                self.rows_failed += 1;
                false
            }
        }
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn rows_failed(&self) -> usize {
        self.rows_failed
    }

    /// Flush buffered rows and hand back the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| {
            QueryTrailError::new(
                ErrorCode::OutputWriteFailed,
                format!("Can't flush report: {}", e.error()),
            )
        })
    }
}
