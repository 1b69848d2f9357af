use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric error codes following QT-XXXX format.
///
/// ## Code Ranges
/// - **1000-1999**: Discovery query errors
/// - **2000-2999**: Batch metadata fetch errors
/// - **3000-3999**: Configuration errors
/// - **4000-4999**: Report output errors
/// - **5000-5999**: Internal/System errors
///
/// Codes are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
#[non_exhaustive]
pub enum ErrorCode {
    // === Discovery Errors (1000-1999) ===
    /// QT-1001: The discovery query could not be submitted
    SubmitFailed = 1001,
    /// QT-1002: A status check for the discovery query failed
    StatusCheckFailed = 1002,
    /// QT-1003: The discovery query ended in a state other than SUCCEEDED
    QueryNotSucceeded = 1003,
    /// QT-1004: The discovery query did not finish before the poll deadline
    PollTimeout = 1004,
    /// QT-1005: A page of discovery results could not be read
    ResultsUnavailable = 1005,
    /// QT-1006: A discovery row did not carry a decodable execution id
    MalformedIdentifier = 1006,

    // === Fetch Errors (2000-2999) ===
    /// QT-2001: A bulk execution lookup failed
    BatchFetchFailed = 2001,
    /// QT-2002: The service returned an execution without an id
    MalformedExecution = 2002,

    // === Configuration Errors (3000-3999) ===
    /// QT-3001: Invalid YAML syntax in the profile file
    InvalidYaml = 3001,
    /// QT-3002: Requested profile does not exist
    ProfileNotFound = 3002,
    /// QT-3003: A setting holds an unusable value
    InvalidSetting = 3003,

    // === Output Errors (4000-4999) ===
    /// QT-4001: The CSV report file could not be created
    OutputCreateFailed = 4001,
    /// QT-4002: The CSV report could not be written or flushed
    OutputWriteFailed = 4002,

    // === Internal Errors (5000-5999) ===
    /// QT-5001: Serialization/deserialization failed
    SerializationFailed = 5001,
    /// QT-5002: Local I/O failure
    Io = 5002,

    /// QT-9999: Unknown/unclassified error
    Unknown = 9999,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the formatted code string (e.g., "QT-2001")
    pub fn as_str(&self) -> String {
        format!("QT-{:04}", self.as_u16())
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self.as_u16() {
            1000..=1999 => ErrorCategory::Discovery,
            2000..=2999 => ErrorCategory::Fetch,
            3000..=3999 => ErrorCategory::Config,
            4000..=4999 => ErrorCategory::Output,
            _ => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> String {
        code.as_str()
    }
}

impl TryFrom<String> for ErrorCode {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let num: u16 = s
            .strip_prefix("QT-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| "Invalid format".to_string())?;
        Self::try_from(num).map_err(|_| "Unknown code".to_string())
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(n: u16) -> std::result::Result<Self, Self::Error> {
        match n {
            1001 => Ok(Self::SubmitFailed),
            1002 => Ok(Self::StatusCheckFailed),
            1003 => Ok(Self::QueryNotSucceeded),
            1004 => Ok(Self::PollTimeout),
            1005 => Ok(Self::ResultsUnavailable),
            1006 => Ok(Self::MalformedIdentifier),
            2001 => Ok(Self::BatchFetchFailed),
            2002 => Ok(Self::MalformedExecution),
            3001 => Ok(Self::InvalidYaml),
            3002 => Ok(Self::ProfileNotFound),
            3003 => Ok(Self::InvalidSetting),
            4001 => Ok(Self::OutputCreateFailed),
            4002 => Ok(Self::OutputWriteFailed),
            5001 => Ok(Self::SerializationFailed),
            5002 => Ok(Self::Io),
            9999 => Ok(Self::Unknown),
            _ => Err(format!("Unknown error code: {}", n)),
        }
    }
}

/// High-level error category, used by the CLI to pick an exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCategory {
    Discovery,
    Fetch,
    Config,
    Output,
    Internal,
}
