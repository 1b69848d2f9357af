use crate::commands::{report, RunSettings};
use crate::output::OutputFormat;
use async_trait::async_trait;
use querytrail_core::record::ExecutionRecord;
use querytrail_core::service::{
    BatchOutput, QueryRequest, QueryService, QueryState, QueryStatus, ResultPage, ServiceError,
};
use querytrail_core::{DecodeMode, RowFilter, TimeWindow, WarehouseConfig};
use querytrail_error::{ErrorCategory, ErrorCode, QueryTrailError};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Succeeds immediately and serves every id it is asked about.
struct StubService {
    ids: Vec<&'static str>,
    fail_fetch: bool,
    calls: AtomicUsize,
}

impl StubService {
    fn new(ids: Vec<&'static str>) -> Self {
        Self {
            ids,
            fail_fetch: false,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QueryService for StubService {
    async fn start_query(&self, _request: &QueryRequest) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("discovery".to_string())
    }

    async fn query_status(&self, _execution_id: &str) -> Result<QueryStatus, ServiceError> {
        Ok(QueryStatus {
            state: QueryState::Succeeded,
            reason: None,
        })
    }

    async fn result_page(
        &self,
        _execution_id: &str,
        _next_token: Option<&str>,
    ) -> Result<ResultPage, ServiceError> {
        let mut rows = vec![vec![Some("requestparameters".to_string())]];
        rows.extend(
            self.ids
                .iter()
                .map(|id| vec![Some(format!(r#"{{"queryExecutionId":"{}"}}"#, id))]),
        );
        Ok(ResultPage {
            rows,
            next_token: None,
        })
    }

    async fn batch_get_executions(&self, ids: &[String]) -> Result<BatchOutput, ServiceError> {
        if self.fail_fetch {
            return Err(ServiceError::request(
                "BatchGetQueryExecution",
                "ThrottlingException",
            ));
        }
        Ok(BatchOutput {
            records: ids
                .iter()
                .enumerate()
                .map(|(i, id)| ExecutionRecord {
                    execution_id: id.clone(),
                    database: Some("analytics".to_string()),
                    scanned_bytes: Some(1_000 * (i as i64 + 1)),
                    query: "SELECT 1".to_string(),
                    ..Default::default()
                })
                .collect(),
            unprocessed: vec![],
        })
    }
}

fn settings(output_file: &Path, filter: RowFilter) -> RunSettings {
    RunSettings {
        window: TimeWindow::new("2024-05-01T00:00:00Z", "2024-05-02T00:00:00Z"),
        warehouse: WarehouseConfig {
            batch_size: 2,
            ..Default::default()
        },
        output_file: output_file.to_path_buf(),
        big_threshold: 1_500,
        filter,
        decode: DecodeMode::Lenient,
    }
}

#[tokio::test]
async fn test_report_writes_csv_and_summary() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.csv");
    let service = StubService::new(vec!["a", "b", "c"]);

    let outcome = report(&service, &settings(&path, RowFilter::All), OutputFormat::Json)
        .await
        .unwrap();

    assert_eq!(outcome.batches, 2);
    assert_eq!(outcome.rows_written, 3);
    assert_eq!(outcome.rows_failed, 0);
    assert_eq!(outcome.stats.query_count, 3);
    // batches [a, b] and [c]: 1000 + 2000 + 1000
    assert_eq!(outcome.stats.total_bytes, 4_000);
    assert_eq!(outcome.stats.big_count, 1);

    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("queryExecutionID,Database,"));
    assert!(lines[1].starts_with("a,analytics,"));
}

#[tokio::test]
async fn test_threshold_filter_limits_rows_not_summary() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("big.csv");
    let service = StubService::new(vec!["a", "b", "c"]);

    let outcome = report(
        &service,
        &settings(&path, RowFilter::AboveThreshold),
        OutputFormat::Yaml,
    )
    .await
    .unwrap();

    assert_eq!(outcome.rows_written, 1);
    assert_eq!(outcome.stats.query_count, 3);
    let csv = std::fs::read_to_string(&path).unwrap();
    assert!(csv.lines().nth(1).unwrap().starts_with("b,"));
}

#[tokio::test]
async fn test_uncreatable_output_fails_before_discovery() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing-dir").join("report.csv");
    let service = StubService::new(vec!["a"]);

    let err = report(&service, &settings(&path, RowFilter::All), OutputFormat::Json)
        .await
        .unwrap_err();

    let err = err.downcast_ref::<QueryTrailError>().unwrap();
    assert_eq!(err.code, ErrorCode::OutputCreateFailed);
    assert_eq!(err.category(), ErrorCategory::Output);
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fetch_failure_maps_to_fetch_category() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.csv");
    let mut service = StubService::new(vec!["a", "b"]);
    service.fail_fetch = true;

    let err = report(&service, &settings(&path, RowFilter::All), OutputFormat::Json)
        .await
        .unwrap_err();

    let err = err.downcast_ref::<QueryTrailError>().unwrap();
    assert_eq!(err.category(), ErrorCategory::Fetch);
}
