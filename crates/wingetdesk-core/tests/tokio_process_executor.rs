#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use wingetdesk_core::execution::{
    CommandRunner, CommandSpec, ProcessSpawnRequest, SPAWN_FAILURE_EXIT_CODE,
    TokioProcessExecutor, spawn_validated,
};
use wingetdesk_core::models::{CoreErrorKind, PackageAction};

fn echo_request() -> ProcessSpawnRequest {
    ProcessSpawnRequest::new(
        PackageAction::ListUpgrades,
        CommandSpec::new("/bin/echo").arg("hello"),
    )
}

fn sleep_request() -> ProcessSpawnRequest {
    ProcessSpawnRequest::new(
        PackageAction::UpgradeAll,
        CommandSpec::new("/bin/sleep").arg("30"),
    )
}

#[tokio::test]
async fn spawns_echo_and_captures_stdout() {
    let executor = TokioProcessExecutor;
    let handle = spawn_validated(&executor, echo_request()).expect("spawn should succeed");

    assert!(handle.pid().is_some());

    let output = handle.wait().await.expect("wait should succeed");
    assert_eq!(output.exit_code, Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    assert!(!output.output_truncated);
}

#[tokio::test]
async fn captures_nonzero_exit_code() {
    let executor = TokioProcessExecutor;
    let request = ProcessSpawnRequest::new(PackageAction::Search, CommandSpec::new("/usr/bin/false"));

    let handle = spawn_validated(&executor, request).expect("spawn should succeed");
    let output = handle.wait().await.expect("wait should succeed");

    assert_eq!(output.exit_code, Some(1));
}

#[tokio::test]
async fn timeout_kills_long_running_process() {
    let executor = TokioProcessExecutor;
    let request = sleep_request().timeout(Duration::from_millis(100));

    let handle = spawn_validated(&executor, request).expect("spawn should succeed");
    let error = handle.wait().await.expect_err("should timeout");

    assert_eq!(error.kind, CoreErrorKind::Timeout);
    assert_eq!(error.action, Some(PackageAction::UpgradeAll));
}

#[tokio::test]
async fn grandchild_holding_the_pipe_keeps_collected_output() {
    let executor = TokioProcessExecutor;
    let request = ProcessSpawnRequest::new(
        PackageAction::Install,
        CommandSpec::new("/bin/sh").args(["-c", "echo installer started; sleep 5 &"]),
    );

    let started = Instant::now();
    let handle = spawn_validated(&executor, request).expect("spawn should succeed");
    let output = handle.wait().await.expect("wait should succeed");

    assert_eq!(output.exit_code, Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "installer started");
    assert!(output.output_truncated);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn timeout_error_carries_the_last_output_line() {
    let executor = TokioProcessExecutor;
    let request = ProcessSpawnRequest::new(
        PackageAction::UpgradeAll,
        CommandSpec::new("/bin/sh").args(["-c", "echo Downloading; sleep 30"]),
    )
    .timeout(Duration::from_millis(300));

    let handle = spawn_validated(&executor, request).expect("spawn should succeed");
    let error = handle.wait().await.expect_err("should timeout");

    assert_eq!(error.kind, CoreErrorKind::Timeout);
    assert!(error.message.ends_with("last output: Downloading"));
}

#[tokio::test]
async fn spawn_nonexistent_program_returns_spawn_failure() {
    let executor = TokioProcessExecutor;
    let request = ProcessSpawnRequest::new(
        PackageAction::Install,
        CommandSpec::new("/nonexistent/winget"),
    );

    let error = match spawn_validated(&executor, request) {
        Err(e) => e,
        Ok(_) => panic!("expected spawn to fail for nonexistent binary"),
    };

    assert_eq!(error.kind, CoreErrorKind::SpawnFailure);
    assert_eq!(error.action, Some(PackageAction::Install));
}

#[test]
fn runner_drives_real_process_to_completion() {
    let runner = CommandRunner::new(Arc::new(TokioProcessExecutor)).unwrap();

    let outcome = runner.run(echo_request());

    assert!(outcome.success());
    assert_eq!(outcome.stdout, "hello");
    assert_eq!(outcome.command_line, "/bin/echo hello");
}

#[test]
fn runner_turns_missing_binary_into_sentinel_result() {
    let runner = CommandRunner::new(Arc::new(TokioProcessExecutor)).unwrap();

    let outcome = runner.run(ProcessSpawnRequest::new(
        PackageAction::ListInstalled,
        CommandSpec::new("/nonexistent/winget").arg("list"),
    ));

    assert_eq!(outcome.exit_code, SPAWN_FAILURE_EXIT_CODE);
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("/nonexistent/winget"));
}

#[test]
fn runner_turns_timeout_into_sentinel_result() {
    let runner = CommandRunner::new(Arc::new(TokioProcessExecutor)).unwrap();

    let outcome = runner.run(sleep_request().timeout(Duration::from_millis(100)));

    assert_eq!(outcome.exit_code, SPAWN_FAILURE_EXIT_CODE);
    assert!(outcome.stderr.contains("timed out"));
    assert!(!runner.is_busy());
}
