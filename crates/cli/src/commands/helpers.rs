//! Shared helper functions and types for CLI commands.
//!
//! # Components
//! - **Settings**: `RunSettings`, the fully resolved inputs of one report run.
//! - **Utilities**: `default_output_file`, `progress_style`, `spinner`.
//! - **Result Types**: `ReportResult`, the machine-readable (JSON/YAML) summary.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use querytrail_core::stats::Summary;
use querytrail_core::{DecodeMode, RowFilter, TimeWindow, WarehouseConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::output::OutputFormat;

/// Everything a report run needs once flags, env and profile are merged.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub window: TimeWindow,
    pub warehouse: WarehouseConfig,
    pub output_file: PathBuf,
    pub big_threshold: i64,
    pub filter: RowFilter,
    pub decode: DecodeMode,
}

/// `querytrail-result_<from>-<to>.csv` with `:` removed so the name is portable.
pub fn default_output_file(from: &str, to: &str) -> PathBuf {
    PathBuf::from(format!("querytrail-result_{}-{}.csv", from, to).replace(':', ""))
}

/// Spinner drawn while waiting on the discovery query; hidden for machine output.
pub fn spinner(format: OutputFormat, message: &str) -> Result<ProgressBar> {
    if format.is_machine_readable() {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

pub fn progress_bar(format: OutputFormat, batches: usize) -> Result<ProgressBar> {
    if format.is_machine_readable() {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(batches as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos}/{len} batches {msg}")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

// ===== Result Types =====

#[derive(Serialize)]
pub struct ReportResult<'a> {
    #[serde(flatten)]
    pub summary: Summary<'a>,
    pub rows_written: usize,
    pub rows_failed: usize,
    pub batches: usize,
}
