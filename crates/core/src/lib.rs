//! querytrail core: reports on prior Athena query executions.
//!
//! A run has three sequential steps:
//!
//! ```text
//! discovery ──> ids ──> fetch (batches of ≤49) ──> CSV rows + RunningStats ──> summary
//!     │                    │
//!     └── QueryService ────┘   (AthenaService in production)
//! ```
//!
//! The CLI crate wires these together; everything here is usable on its own with any
//! [`service::QueryService`] implementation.

pub mod athena;
pub mod batch;
pub mod config;
pub mod discovery;
pub mod fetch;
pub mod record;
pub mod report;
pub mod service;
pub mod stats;
pub mod units;

pub use config::WarehouseConfig;
pub use discovery::{discover, DecodeMode, PollSettings, TimeWindow};
pub use fetch::{fetch_all, fetch_batch, BatchReport};
pub use record::ExecutionRecord;
pub use report::{ReportWriter, RowFilter};
pub use service::QueryService;
pub use stats::RunningStats;
