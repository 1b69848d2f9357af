use std::process::Command;
use tempfile::TempDir;

fn querytrail(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_querytrail"));
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("QUERYTRAIL_PROFILE")
        .env_remove("QUERYTRAIL_REGION")
        .env_remove("QUERYTRAIL_RESULT_LOCATION")
        .env("QUERYTRAIL_CONFIG", home.path().join("config.yaml"))
        .env("AWS_ACCESS_KEY_ID", "AKIDTEST")
        .env("AWS_SECRET_ACCESS_KEY", "secret")
        .env("AWS_EC2_METADATA_DISABLED", "true");
    cmd
}

#[test]
fn test_missing_time_range_exits_31() {
    let home = TempDir::new().unwrap();
    let output = querytrail(&home)
        .args(["--from-time", "2024-05-01T00:00:00Z"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(31));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--from-time and --to-time are required"));
    assert!(stderr.contains("--bigger-then"));
}

#[test]
fn test_version_wins_over_missing_times() {
    let home = TempDir::new().unwrap();
    let output = querytrail(&home).arg("--version").output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("querytrail "));
}

#[test]
fn test_broken_config_exits_3() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("config.yaml"), "profiles: [unclosed").unwrap();

    let output = querytrail(&home)
        .args(["--from-time", "a", "--to-time", "b"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("QT-3001"));
}

#[test]
fn test_unknown_profile_exits_3_with_json_error() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("config.yaml"),
        "profiles:\n  production:\n    region: us-east-1\n",
    )
    .unwrap();

    let output = querytrail(&home)
        .args(["--from-time", "a", "--to-time", "b", "--profile", "prod", "--output", "json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["exit_code"], 3);
    assert!(body["message"].as_str().unwrap().contains("QT-3002"));
}

#[test]
fn test_uncreatable_report_exits_10() {
    let home = TempDir::new().unwrap();
    let target = home.path().join("no-such-dir").join("out.csv");

    let output = querytrail(&home)
        .args(["--from-time", "a", "--to-time", "b", "--output-file"])
        .arg(&target)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(10));
    assert!(String::from_utf8_lossy(&output.stderr).contains("QT-4001"));
}
