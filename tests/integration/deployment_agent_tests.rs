use crate::common::*;
use nlm_cicd::{
    application::services::DeploymentAgent, reporting::OverallStatus, Environment,
};
use std::sync::Arc;

#[tokio::test]
async fn test_failed_attempt_is_triaged_then_retried() {
    let server = FakeGitHub::start().await;
    server.add_run(21, None).await;
    server.queue_run_state("completed", Some("failure")).await;
    server.queue_run_state("completed", Some("success")).await;
    server.set_logs("npm ERR! could not resolve dependency tree").await;
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(server.config(dir.path()));

    let summary = DeploymentAgent::new(server.client(&config), config.clone())
        .run()
        .await
        .unwrap();

    assert!(summary.succeeded());
    assert_eq!(summary.results[0].environment, Environment::Dev);
    assert_eq!(summary.results[0].attempts, 2);
    assert_eq!(summary.report.overall_status, OverallStatus::Success);

    // One failed attempt: logs fetched, hotfix branch cut from main, issue filed.
    assert_eq!(server.calls_to("GET", "actions/runs/21/logs").await.len(), 1);
    assert_eq!(server.calls_to("GET", "git/ref/heads/main").await.len(), 1);

    let refs = server.calls_to("POST", "git/refs").await;
    assert_eq!(refs.len(), 1);
    let ref_body = refs[0].body.clone().unwrap();
    assert!(ref_body["ref"]
        .as_str()
        .unwrap()
        .starts_with("refs/heads/hotfix/cicd-dev-"));
    assert_eq!(ref_body["sha"], MAIN_SHA);

    let issues = server.calls_to("POST", "issues").await;
    assert_eq!(issues.len(), 1);
    let issue = issues[0].body.clone().unwrap();
    assert_eq!(issue["title"], "[AutoBug][DEV] Dependency Error");
    assert_eq!(issue["labels"], serde_json::json!(["bug", "cicd", "dev"]));
    assert!(issue["body"]
        .as_str()
        .unwrap()
        .contains("## Root Cause\nnpm ERR! could not resolve dependency tree..."));

    let dev_log = tokio::fs::read_to_string(dir.path().join("deployment_log_dev.md"))
        .await
        .unwrap();
    assert!(dev_log.contains("**Status:** FAILED"));
    assert!(dev_log.contains(
        "Issue type: dependency_error, Issue: https://github.com/acme/nlm/issues/1, Branch: hotfix/cicd-dev-"
    ));
    assert!(dev_log.contains("## Attempt 2"));
    assert!(!dir.path().join("FINAL_FAILURE_REPORT.md").exists());
}

#[tokio::test]
async fn test_exhausted_retries_produce_failure_report() {
    let server = FakeGitHub::start().await;
    server.set_dispatch_response(500, "{\"message\":\"Server Error\"}").await;
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(server.config(dir.path()));

    let summary = DeploymentAgent::new(server.client(&config), config.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(
        summary.failed_environments(),
        vec![Environment::Dev, Environment::Qa, Environment::Stage]
    );
    assert_eq!(summary.report.overall_status, OverallStatus::Failed);
    // max_retries = 2 per environment.
    assert_eq!(server.calls_to("POST", "actions/workflows").await.len(), 6);
    assert!(server.calls_to("POST", "issues").await.is_empty());

    let report = tokio::fs::read_to_string(dir.path().join("FINAL_FAILURE_REPORT.md"))
        .await
        .unwrap();
    assert!(report.contains("following environments: dev, qa, stage"));
    assert!(report.contains("### QA\n## Attempt 1"));
    assert_eq!(report.matches("Failed to trigger workflow").count(), 6);
}

#[tokio::test]
async fn test_zipped_run_logs_are_classified() {
    let server = FakeGitHub::start().await;
    server.add_run(31, None).await;
    server.queue_run_state("completed", Some("failure")).await;
    server
        .set_log_archive(&[
            ("deploy/1_Set up job.txt", "Runner image ubuntu-22.04"),
            ("deploy/4_Run tests.txt", "FAILED tests/test_api.py - AssertionError"),
        ])
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(server.config(dir.path()));

    let agent = DeploymentAgent::new(server.client(&config), config.clone());
    let result = agent.deploy_environment(Environment::Qa).await.unwrap();

    assert!(!result.succeeded);
    let issues = server.calls_to("POST", "issues").await;
    assert_eq!(issues.len(), 2);
    let issue = issues[0].body.clone().unwrap();
    assert_eq!(issue["title"], "[AutoBug][QA] Test Failure");
    assert!(issue["body"]
        .as_str()
        .unwrap()
        .contains("==> deploy/1_Set up job.txt <==\nRunner image ubuntu-22.04"));
}
