//! The seam between the report pipeline and the managed query service.
//!
//! Discovery and fetch only talk to [`QueryService`]. [`crate::athena::AthenaService`]
//! is the production implementation; tests plug in an in-memory one.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::ExecutionRecord;

/// Lifecycle state of a submitted query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    Unknown(String),
}

impl QueryState {
    pub fn parse(state: &str) -> Self {
        match state {
            "QUEUED" => Self::Queued,
            "RUNNING" => Self::Running,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "CANCELLED" => Self::Cancelled,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Unknown(other) => other,
        }
    }

    /// Still waiting on the service; keep polling.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }
}

impl std::fmt::Display for QueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStatus {
    pub state: QueryState,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub sql: String,
    pub database: String,
    pub output_location: String,
}

/// Raw result row: one optional text value per column.
pub type ResultRow = Vec<Option<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    pub rows: Vec<ResultRow>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnprocessedId {
    pub execution_id: Option<String>,
    pub error_code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub records: Vec<ExecutionRecord>,
    pub unprocessed: Vec<UnprocessedId>,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{operation} failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} returned a malformed response: {detail}")]
    MalformedResponse {
        operation: &'static str,
        detail: String,
    },
}

impl ServiceError {
    pub fn request(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Request {
            operation,
            message: message.into(),
        }
    }

    pub fn malformed(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation,
            detail: detail.into(),
        }
    }
}

/// Calls into the managed query service. Every call is attempted once.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submit a query and return its execution id.
    async fn start_query(&self, request: &QueryRequest) -> Result<String, ServiceError>;

    async fn query_status(&self, execution_id: &str) -> Result<QueryStatus, ServiceError>;

    /// Read one page of results; `next_token` is `None` for the first page.
    async fn result_page(
        &self,
        execution_id: &str,
        next_token: Option<&str>,
    ) -> Result<ResultPage, ServiceError>;

    /// Bulk lookup of execution metadata for up to 50 ids.
    async fn batch_get_executions(&self, ids: &[String]) -> Result<BatchOutput, ServiceError>;
}
