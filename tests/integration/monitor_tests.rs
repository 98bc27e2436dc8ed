use crate::common::*;
use nlm_cicd::{
    application::services::{PollPolicy, RunMonitor},
    AppError,
};
use std::time::Duration;

fn fast_policy(max_attempts: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::ZERO,
        max_attempts,
    }
}

#[tokio::test]
async fn test_polls_until_completed() {
    let server = FakeGitHub::start().await;
    server.queue_run_state("queued", None).await;
    server.queue_run_state("in_progress", None).await;
    server.queue_run_state("completed", Some("success")).await;
    let dir = tempfile::tempdir().unwrap();
    let config = server.config(dir.path());

    let outcome = RunMonitor::new(server.client(&config), fast_policy(10))
        .wait_for_completion(77)
        .await
        .unwrap();

    assert!(outcome.succeeded);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.run.id, 77);
    assert_eq!(server.calls_to("GET", "actions/runs/77").await.len(), 3);
}

#[tokio::test]
async fn test_completed_failure_is_not_success() {
    let server = FakeGitHub::start().await;
    server.queue_run_state("completed", Some("failure")).await;
    let dir = tempfile::tempdir().unwrap();
    let config = server.config(dir.path());

    let outcome = RunMonitor::new(server.client(&config), fast_policy(10))
        .wait_for_completion(5)
        .await
        .unwrap();

    assert!(!outcome.succeeded);
    assert_eq!(outcome.run.conclusion.as_deref(), Some("failure"));
    assert_eq!(outcome.attempts, 1);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let server = FakeGitHub::start().await;
    server.queue_run_state("in_progress", None).await;
    let dir = tempfile::tempdir().unwrap();
    let config = server.config(dir.path());

    let err = RunMonitor::new(server.client(&config), fast_policy(4))
        .wait_for_completion(9)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::MonitorTimeout {
            run_id: 9,
            attempts: 4
        }
    ));
    assert_eq!(server.calls_to("GET", "actions/runs/9").await.len(), 4);
}

#[tokio::test]
async fn test_missing_run_is_an_api_error() {
    let server = FakeGitHub::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = server.config(dir.path());

    let err = RunMonitor::new(server.client(&config), fast_policy(3))
        .wait_for_completion(1)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::GitHubApiError { status: 404, .. }));
}
