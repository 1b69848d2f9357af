use querytrail_error::{ErrorCode, ErrorContext, QueryTrailError};
use serde_json::Value;

#[test]
fn test_json_serialization() {
    let error = QueryTrailError::new(ErrorCode::QueryNotSucceeded, "Discovery query ended as FAILED")
        .with_context(ErrorContext::Query {
            execution_id: Some("5b8e0c52".to_string()),
            state: Some("FAILED".to_string()),
            reason: Some("TABLE_NOT_FOUND".to_string()),
        })
        .with_hint("Check that the audit table exists in the configured database");

    let json = error.to_json();
    println!("JSON: {}", json);

    let v: Value = serde_json::from_str(&json).expect("valid json");

    assert_eq!(v["code"], "QT-1003");
    assert_eq!(v["message"], "Discovery query ended as FAILED");
    assert_eq!(v["context"]["type"], "query");
    assert_eq!(v["context"]["state"], "FAILED");
    assert_eq!(v["context"]["execution_id"], "5b8e0c52");
}

#[test]
fn test_roundtrip_preserves_code() {
    let error = QueryTrailError::new(ErrorCode::OutputCreateFailed, "permission denied")
        .with_context(ErrorContext::Output {
            path: "/readonly/report.csv".to_string(),
        });

    let back: QueryTrailError = serde_json::from_str(&error.to_json()).expect("valid json");
    assert_eq!(back.code, ErrorCode::OutputCreateFailed);
    assert!(matches!(back.context, Some(ErrorContext::Output { .. })));
}

#[test]
fn test_error_code_parsing() {
    let code: ErrorCode = "QT-2002".to_string().try_into().unwrap();
    assert_eq!(code, ErrorCode::MalformedExecution);
}
