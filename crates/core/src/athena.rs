//! Amazon Athena implementation of [`QueryService`].
//!
//! Credentials come from the default AWS provider chain. The SDK's own retry layer is
//! turned off so every call is attempted exactly once.

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{QueryExecution, QueryExecutionContext, ResultConfiguration};
use aws_sdk_athena::Client;
use tracing::debug;

use crate::record::ExecutionRecord;
use crate::service::{
    BatchOutput, QueryRequest, QueryService, QueryState, QueryStatus, ResultPage, ServiceError,
    UnprocessedId,
};

#[derive(Debug, Clone)]
pub struct AthenaService {
    client: Client,
}

impl AthenaService {
    /// Resolve credentials for `region` and build a client.
    pub async fn connect(region: &str) -> Self {
        debug!("Loading AWS configuration for region {}", region);
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .retry_config(RetryConfig::disabled())
            .load()
            .await;
        Self::from_client(Client::new(&sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn request_error<E: std::error::Error>(operation: &'static str, err: E) -> ServiceError {
    ServiceError::request(operation, DisplayErrorContext(err).to_string())
}

fn to_record(execution: &QueryExecution) -> Result<ExecutionRecord, ServiceError> {
    let execution_id = execution
        .query_execution_id()
        .ok_or_else(|| ServiceError::malformed("BatchGetQueryExecution", "execution without id"))?;
    let status = execution.status();
    let statistics = execution.statistics();

    Ok(ExecutionRecord {
        execution_id: execution_id.to_string(),
        database: execution
            .query_execution_context()
            .and_then(|c| c.database())
            .map(str::to_string),
        submitted_at: status
            .and_then(|s| s.submission_date_time())
            .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
        engine_time_ms: statistics.and_then(|s| s.engine_execution_time_in_millis()),
        output_location: execution
            .result_configuration()
            .and_then(|r| r.output_location())
            .map(str::to_string),
        scanned_bytes: statistics.and_then(|s| s.data_scanned_in_bytes()),
        query: execution.query().unwrap_or_default().to_string(),
        state: status
            .and_then(|s| s.state())
            .map(|s| s.as_str().to_string()),
        workgroup: execution.work_group().map(str::to_string),
    })
}

#[async_trait]
impl QueryService for AthenaService {
    async fn start_query(&self, request: &QueryRequest) -> Result<String, ServiceError> {
        let output = self
            .client
            .start_query_execution()
            .query_string(&request.sql)
            .query_execution_context(
                QueryExecutionContext::builder()
                    .database(&request.database)
                    .build(),
            )
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(&request.output_location)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| request_error("StartQueryExecution", e))?;

        output
            .query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::malformed("StartQueryExecution", "missing QueryExecutionId"))
    }

    async fn query_status(&self, execution_id: &str) -> Result<QueryStatus, ServiceError> {
        let output = self
            .client
            .get_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await
            .map_err(|e| request_error("GetQueryExecution", e))?;

        let status = output
            .query_execution()
            .and_then(|q| q.status())
            .ok_or_else(|| ServiceError::malformed("GetQueryExecution", "missing Status"))?;

        Ok(QueryStatus {
            state: status
                .state()
                .map(|s| QueryState::parse(s.as_str()))
                .unwrap_or_else(|| QueryState::Unknown("<missing>".to_string())),
            reason: status.state_change_reason().map(str::to_string),
        })
    }

    async fn result_page(
        &self,
        execution_id: &str,
        next_token: Option<&str>,
    ) -> Result<ResultPage, ServiceError> {
        let output = self
            .client
            .get_query_results()
            .query_execution_id(execution_id)
            .set_next_token(next_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| request_error("GetQueryResults", e))?;

        let rows = output
            .result_set()
            .map(|set| {
                set.rows()
                    .iter()
                    .map(|row| {
                        row.data()
                            .iter()
                            .map(|datum| datum.var_char_value().map(str::to_string))
                            .collect()
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ResultPage {
            rows,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn batch_get_executions(&self, ids: &[String]) -> Result<BatchOutput, ServiceError> {
        let output = self
            .client
            .batch_get_query_execution()
            .set_query_execution_ids(Some(ids.to_vec()))
            .send()
            .await
            .map_err(|e| request_error("BatchGetQueryExecution", e))?;

        let records = output
            .query_executions()
            .iter()
            .map(to_record)
            .collect::<Result<Vec<_>, _>>()?;

        let unprocessed = output
            .unprocessed_query_execution_ids()
            .iter()
            .map(|u| UnprocessedId {
                execution_id: u.query_execution_id().map(str::to_string),
                error_code: u.error_code().map(str::to_string),
                message: u.error_message().map(str::to_string),
            })
            .collect();

        Ok(BatchOutput {
            records,
            unprocessed,
        })
    }
}
