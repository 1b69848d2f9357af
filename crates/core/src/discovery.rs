//! Identifier discovery.
//!
//! Runs one query against the audit-log table for the requested window, waits for it
//! to finish, pages through its results and decodes one execution id per row.
//!
//! ```text
//! SUBMITTED -> QUEUED | RUNNING (poll) -> SUCCEEDED      -> read pages
//!                                      -> other terminal -> QT-1003
//!                                      -> deadline       -> QT-1004
//! ```

use querytrail_error::{ErrorCode, ErrorContext, QueryTrailError, Result};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::WarehouseConfig;
use crate::service::{QueryRequest, QueryService, QueryState, ResultRow};

/// Bounds of the discovery query. Passed through verbatim; `from < to` is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: String,
    pub to: String,
}

impl TimeWindow {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Give up once this much time has passed since submission. `None` waits forever.
    pub deadline: Option<Duration>,
}

/// How to treat a discovery row whose text column is not the expected JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Drop the row and log a warning.
    #[default]
    Lenient,
    /// Fail discovery with QT-1006.
    Strict,
}

#[derive(Debug, Deserialize)]
struct RequestParameters {
    #[serde(
        rename = "queryExecutionId",
        alias = "QueryExecutionId",
        alias = "queryExecutionID"
    )]
    query_execution_id: String,
}

pub fn discovery_sql(audit_table: &str, event_name: &str, window: &TimeWindow) -> String {
    format!(
        "SELECT DISTINCT requestparameters \
         FROM {} \
         WHERE eventname = '{}' \
         AND eventtime > '{}' \
         AND eventtime < '{}'",
        audit_table, event_name, window.from, window.to
    )
}

/// Discover execution ids touched by the configured event within `window`.
pub async fn discover<S>(
    service: &S,
    config: &WarehouseConfig,
    window: &TimeWindow,
    mode: DecodeMode,
) -> Result<Vec<String>>
where
    S: QueryService + ?Sized,
{
    let request = QueryRequest {
        sql: discovery_sql(&config.audit_table, &config.event_name, window),
        database: config.database.clone(),
        output_location: config.output_location(),
    };
    debug!("Discovery query: {}", request.sql);

    let rows = run_query(service, &request, config.poll_settings()).await?;
    let ids = decode_identifiers(&rows, mode)?;
    info!(
        "Discovered {} execution ids from {} rows",
        ids.len(),
        rows.len()
    );
    Ok(ids)
}

/// Submit `request`, wait for it to succeed and return its data rows (header dropped).
pub async fn run_query<S>(
    service: &S,
    request: &QueryRequest,
    poll: PollSettings,
) -> Result<Vec<ResultRow>>
where
    S: QueryService + ?Sized,
{
    let execution_id = service.start_query(request).await.map_err(|e| {
        QueryTrailError::new(ErrorCode::SubmitFailed, e.to_string())
            .with_hint("Check credentials, region and the result location")
    })?;
    info!("Submitted discovery query {}", execution_id);

    wait_for_completion(service, &execution_id, poll).await?;
    fetch_rows(service, &execution_id).await
}

/// Poll the query status at a fixed interval until it leaves QUEUED/RUNNING.
pub async fn wait_for_completion<S>(
    service: &S,
    execution_id: &str,
    poll: PollSettings,
) -> Result<()>
where
    S: QueryService + ?Sized,
{
    let started = Instant::now();
    loop {
        let status = service.query_status(execution_id).await.map_err(|e| {
            QueryTrailError::new(ErrorCode::StatusCheckFailed, e.to_string()).with_context(
                ErrorContext::Query {
                    execution_id: Some(execution_id.to_string()),
                    state: None,
                    reason: None,
                },
            )
        })?;
        debug!("Query {} status: {}", execution_id, status.state);

        if !status.state.is_pending() {
            if status.state == QueryState::Succeeded {
                return Ok(());
            }
            let reason = status.reason.clone();
            return Err(QueryTrailError::new(
                ErrorCode::QueryNotSucceeded,
                format!(
                    "Query {} returned unexpected status: {}{}",
                    execution_id,
                    status.state,
                    reason
                        .as_deref()
                        .map(|r| format!(" ({})", r))
                        .unwrap_or_default()
                ),
            )
            .with_context(ErrorContext::Query {
                execution_id: Some(execution_id.to_string()),
                state: Some(status.state.to_string()),
                reason,
            }));
        }

        if let Some(deadline) = poll.deadline {
            let elapsed = started.elapsed();
            if elapsed >= deadline {
                return Err(QueryTrailError::new(
                    ErrorCode::PollTimeout,
                    format!(
                        "Query {} still {} after {:?}",
                        execution_id, status.state, elapsed
                    ),
                )
                .with_context(ErrorContext::Query {
                    execution_id: Some(execution_id.to_string()),
                    state: Some(status.state.to_string()),
                    reason: None,
                })
                .with_hint("Raise --poll-timeout or narrow the time window"));
            }
        }

        tokio::time::sleep(poll.interval).await;
    }
}

/// Read every result page, dropping the header row of the first page.
pub async fn fetch_rows<S>(service: &S, execution_id: &str) -> Result<Vec<ResultRow>>
where
    S: QueryService + ?Sized,
{
    let mut rows = Vec::new();
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = service
            .result_page(execution_id, next_token.as_deref())
            .await
            .map_err(|e| {
                QueryTrailError::new(ErrorCode::ResultsUnavailable, e.to_string()).with_context(
                    ErrorContext::Query {
                        execution_id: Some(execution_id.to_string()),
                        state: Some("SUCCEEDED".to_string()),
                        reason: None,
                    },
                )
            })?;
        pages += 1;
        rows.extend(page.rows);

        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    debug!("Read {} rows in {} pages", rows.len(), pages);
    if !rows.is_empty() {
        rows.remove(0);
    }
    Ok(rows)
}

/// Decode the JSON request parameters in each row's first column into an execution id.
pub fn decode_identifiers(rows: &[ResultRow], mode: DecodeMode) -> Result<Vec<String>> {
    let mut ids = Vec::with_capacity(rows.len());

    for (row_index, row) in rows.iter().enumerate() {
        let raw = row.first().and_then(|c| c.as_deref()).unwrap_or_default();
        let decoded = serde_json::from_str::<RequestParameters>(raw)
            .map_err(|e| e.to_string())
            .and_then(|p| {
                if p.query_execution_id.is_empty() {
                    Err("empty queryExecutionId".to_string())
                } else {
                    Ok(p.query_execution_id)
                }
            });

        match decoded {
            Ok(id) => ids.push(id),
            Err(reason) => match mode {
                DecodeMode::Lenient => {
                    warn!("Skipping discovery row {}: {}", row_index, reason);
                }
                DecodeMode::Strict => {
                    return Err(QueryTrailError::new(
                        ErrorCode::MalformedIdentifier,
                        format!("Discovery row {} is not decodable: {}", row_index, reason),
                    )
                    .with_context(ErrorContext::Decode {
                        row_index,
                        raw: raw.to_string(),
                    }));
                }
            },
        }
    }

    Ok(ids)
}
