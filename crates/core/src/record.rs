use chrono::{DateTime, Utc};
use serde::Serialize;

/// Stand-in for a missing engine time or scanned-bytes value in the report.
pub const MISSING: i64 = -1;

/// Metadata of one prior query execution, as returned by the bulk lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionRecord {
    pub execution_id: String,
    pub database: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub engine_time_ms: Option<i64>,
    pub output_location: Option<String>,
    pub scanned_bytes: Option<i64>,
    pub query: String,
    pub state: Option<String>,
    pub workgroup: Option<String>,
}

impl ExecutionRecord {
    pub fn engine_time_or_missing(&self) -> i64 {
        self.engine_time_ms.unwrap_or(MISSING)
    }

    pub fn scanned_or_missing(&self) -> i64 {
        self.scanned_bytes.unwrap_or(MISSING)
    }

    /// Scanned bytes as counted into totals and comparisons; absent counts as zero.
    pub fn scanned_for_totals(&self) -> i64 {
        self.scanned_bytes.unwrap_or(0).max(0)
    }
}
