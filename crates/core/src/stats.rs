use serde::Serialize;
use std::fmt;

use crate::discovery::TimeWindow;
use crate::units::humanize_bytes;

/// What [`RunningStats::observe`] saw for a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub scanned_bytes: i64,
    /// Largest value seen before this record
    pub previous_largest: i64,
    pub is_big: bool,
}

/// Aggregates over every execution record of a run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunningStats {
    pub from_time: String,
    pub to_time: String,
    pub result_name: String,
    pub big_threshold: i64,
    pub total_bytes: i64,
    pub query_count: u64,
    pub big_count: u64,
    pub largest_bytes: i64,
}

impl RunningStats {
    pub fn new(window: &TimeWindow, result_name: impl Into<String>, big_threshold: i64) -> Self {
        Self {
            from_time: window.from.clone(),
            to_time: window.to.clone(),
            result_name: result_name.into(),
            big_threshold,
            total_bytes: 0,
            query_count: 0,
            big_count: 0,
            largest_bytes: 0,
        }
    }

    /// Fold one record's scanned bytes into the aggregates.
    pub fn observe(&mut self, scanned_bytes: i64) -> Observation {
        let previous_largest = self.largest_bytes;
        let is_big = scanned_bytes > self.big_threshold;

        self.query_count += 1;
        self.total_bytes = self.total_bytes.saturating_add(scanned_bytes);
        if is_big {
            self.big_count += 1;
        }
        if scanned_bytes > self.largest_bytes {
            self.largest_bytes = scanned_bytes;
        }

        Observation {
            scanned_bytes,
            previous_largest,
            is_big,
        }
    }

    /// Machine-readable view of the summary, with humanized sizes alongside raw bytes.
    pub fn summary(&self) -> Summary<'_> {
        Summary {
            period_from: &self.from_time,
            period_to: &self.to_time,
            total_bytes: self.total_bytes,
            total_humanized: humanize_bytes(self.total_bytes),
            query_count: self.query_count,
            big_threshold_bytes: self.big_threshold,
            big_count: self.big_count,
            largest_bytes: self.largest_bytes,
            largest_humanized: humanize_bytes(self.largest_bytes),
            file_name: &self.result_name,
        }
    }
}

impl fmt::Display for RunningStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Period: {} - {}", self.from_time, self.to_time)?;
        writeln!(f, "Total data: {}", humanize_bytes(self.total_bytes))?;
        writeln!(f, "Count of queries: {}", self.query_count)?;
        writeln!(
            f,
            "Count of big queries (>{}): {}",
            humanize_bytes(self.big_threshold),
            self.big_count
        )?;
        writeln!(f, "Biggest query: {}", humanize_bytes(self.largest_bytes))?;
        writeln!(f, "File name: {}", self.result_name)
    }
}

#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub period_from: &'a str,
    pub period_to: &'a str,
    pub total_bytes: i64,
    pub total_humanized: String,
    pub query_count: u64,
    pub big_threshold_bytes: i64,
    pub big_count: u64,
    pub largest_bytes: i64,
    pub largest_humanized: String,
    pub file_name: &'a str,
}
