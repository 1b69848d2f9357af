#![allow(dead_code)]

use async_trait::async_trait;
use querytrail_core::record::ExecutionRecord;
use querytrail_core::service::{
    BatchOutput, QueryRequest, QueryService, QueryState, QueryStatus, ResultPage, ResultRow,
    ServiceError, UnprocessedId,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Scripted in-memory query service.
///
/// Status checks pop from `states` and keep returning the last one once exhausted.
#[derive(Default)]
pub struct FakeService {
    pub states: Mutex<VecDeque<QueryState>>,
    pub pages: Vec<ResultPage>,
    pub records: HashMap<String, ExecutionRecord>,
    pub fail_batch: Option<usize>,
    pub fail_start: bool,
    pub submitted: Mutex<Vec<QueryRequest>>,
    pub status_calls: Mutex<usize>,
    pub page_tokens: Mutex<Vec<Option<String>>>,
    pub batches: Mutex<Vec<Vec<String>>>,
}

impl FakeService {
    pub fn new(states: Vec<QueryState>, pages: Vec<ResultPage>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            pages,
            ..Default::default()
        }
    }

    pub fn with_records(mut self, records: Vec<ExecutionRecord>) -> Self {
        self.records = records
            .into_iter()
            .map(|r| (r.execution_id.clone(), r))
            .collect();
        self
    }

    pub fn batch_calls(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryService for FakeService {
    async fn start_query(&self, request: &QueryRequest) -> Result<String, ServiceError> {
        if self.fail_start {
            return Err(ServiceError::request("StartQueryExecution", "AccessDeniedException"));
        }
        self.submitted.lock().unwrap().push(request.clone());
        Ok("discovery-1".to_string())
    }

    async fn query_status(&self, _execution_id: &str) -> Result<QueryStatus, ServiceError> {
        *self.status_calls.lock().unwrap() += 1;
        let mut states = self.states.lock().unwrap();
        let state = if states.len() > 1 {
            states.pop_front().unwrap()
        } else {
            states.front().cloned().unwrap_or(QueryState::Succeeded)
        };
        let reason = match state {
            QueryState::Failed => Some("TABLE_NOT_FOUND: cloudtrail_logs".to_string()),
            _ => None,
        };
        Ok(QueryStatus { state, reason })
    }

    async fn result_page(
        &self,
        _execution_id: &str,
        next_token: Option<&str>,
    ) -> Result<ResultPage, ServiceError> {
        self.page_tokens
            .lock()
            .unwrap()
            .push(next_token.map(str::to_string));
        let index = match next_token {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| ServiceError::request("GetQueryResults", "bad token"))?,
        };
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| ServiceError::request("GetQueryResults", "no such page"))
    }

    async fn batch_get_executions(&self, ids: &[String]) -> Result<BatchOutput, ServiceError> {
        let call = {
            let mut batches = self.batches.lock().unwrap();
            batches.push(ids.to_vec());
            batches.len() - 1
        };
        if self.fail_batch == Some(call) {
            return Err(ServiceError::request(
                "BatchGetQueryExecution",
                "ThrottlingException: Rate exceeded",
            ));
        }

        let mut output = BatchOutput::default();
        for id in ids {
            match self.records.get(id) {
                Some(record) => output.records.push(record.clone()),
                None => output.unprocessed.push(UnprocessedId {
                    execution_id: Some(id.clone()),
                    error_code: Some("INVALID_INPUT".to_string()),
                    message: Some("QueryExecution not found".to_string()),
                }),
            }
        }
        Ok(output)
    }
}

pub fn header() -> ResultRow {
    vec![Some("requestparameters".to_string())]
}

pub fn id_row(id: &str) -> ResultRow {
    vec![Some(format!(r#"{{"queryExecutionId":"{}"}}"#, id))]
}

pub fn page(rows: Vec<ResultRow>, next: Option<usize>) -> ResultPage {
    ResultPage {
        rows,
        next_token: next.map(|n| format!("page-{}", n)),
    }
}

pub fn record(id: &str, scanned: Option<i64>) -> ExecutionRecord {
    ExecutionRecord {
        execution_id: id.to_string(),
        database: Some("analytics".to_string()),
        engine_time_ms: Some(1200),
        output_location: Some(format!("s3://team-results/{}.csv", id)),
        scanned_bytes: scanned,
        query: format!("SELECT *\nFROM \"events_{}\"", id),
        state: Some("SUCCEEDED".to_string()),
        ..Default::default()
    }
}
