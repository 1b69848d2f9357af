use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::discovery::PollSettings;

// Default constants
pub const DEFAULT_REGION: &str = "us-east-2";
pub const DEFAULT_DATABASE: &str = "default";
pub const DEFAULT_RESULT_LOCATION: &str = "s3://querytrail-athena-query-results";
pub const DEFAULT_AUDIT_TABLE: &str = "cloudtrail_logs";
pub const DEFAULT_EVENT_NAME: &str = "GetQueryExecution";

/// One under the service-side cap for a bulk execution lookup.
pub const DEFAULT_BATCH_SIZE: usize = 49;
pub const MAX_BATCH_SIZE: usize = 50;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// 1 TiB
pub const DEFAULT_BIG_THRESHOLD: i64 = 1_099_511_627_776;

/// Where and how the discovery query and the bulk lookups run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// `s3://` prefix the discovery query writes its results under
    #[serde(default = "default_result_location")]
    pub result_location: String,
    #[serde(default = "default_audit_table")]
    pub audit_table: String,
    #[serde(default = "default_event_name")]
    pub event_name: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// No deadline when unset
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            database: default_database(),
            result_location: default_result_location(),
            audit_table: default_audit_table(),
            event_name: default_event_name(),
            batch_size: default_batch_size(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_timeout_secs: None,
        }
    }
}

impl WarehouseConfig {
    /// Batch size clamped into what the bulk lookup accepts.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            deadline: self.poll_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Result location with the `s3://` scheme applied when a bare bucket was configured.
    pub fn output_location(&self) -> String {
        if self.result_location.starts_with("s3://") {
            self.result_location.clone()
        } else {
            format!("s3://{}", self.result_location)
        }
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}
fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}
fn default_result_location() -> String {
    DEFAULT_RESULT_LOCATION.to_string()
}
fn default_audit_table() -> String {
    DEFAULT_AUDIT_TABLE.to_string()
}
fn default_event_name() -> String {
    DEFAULT_EVENT_NAME.to_string()
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
