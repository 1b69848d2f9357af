//! Process exit codes.
//!
//! Scripts wrapping the report distinguish failure classes by these values.

/// Success (standard convention), also used for `--version`
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error (fallback for unknown errors)
pub const GENERAL_ERROR: i32 = 1;

/// Discovery query failed: submission, polling, unexpected terminal state, poll timeout, strict decode
pub const DISCOVERY_ERROR: i32 = 1;

/// Batch metadata fetch failed
pub const FETCH_ERROR: i32 = 2;

/// Configuration error (YAML parse failure, unknown profile)
pub const CONFIG_ERROR: i32 = 3;

/// The report file could not be created or written
pub const OUTPUT_ERROR: i32 = 10;

/// `--from-time` or `--to-time` missing
pub const MISSING_TIME_RANGE: i32 = 31;

/// Interrupted by Ctrl-C (128 + SIGINT)
pub const INTERRUPTED: i32 = 130;
