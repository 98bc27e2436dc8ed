use crate::common::*;
use nlm_cicd::{
    application::services::{DeploymentSequence, TriggerOptions},
    reporting::OverallStatus,
    AppError, Environment,
};
use std::sync::Arc;

async fn dispatched_environments(server: &FakeGitHub) -> Vec<String> {
    server
        .calls_to("POST", "actions/workflows")
        .await
        .iter()
        .filter_map(|c| c.body.as_ref())
        .map(|body| body["inputs"]["environment"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_triggers_dev_qa_stage_in_order() {
    let server = FakeGitHub::start().await;
    server.add_run(10, None).await;
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(server.config(dir.path()));

    let summary = DeploymentSequence::new(server.client(&config), config.clone())
        .run(&Environment::DEPLOY_SEQUENCE, false, &TriggerOptions::default())
        .await
        .unwrap();

    assert!(summary.succeeded());
    assert_eq!(dispatched_environments(&server).await, vec!["dev", "qa", "stage"]);
    assert_eq!(summary.stages[0].dispatch.monitor_url, config.run_url(10));
    assert_eq!(summary.report.overall_status, OverallStatus::Success);

    let reports = std::fs::read_dir(dir.path().join("reports")).unwrap().count();
    assert_eq!(reports, 1);
}

#[tokio::test]
async fn test_monitored_failure_stops_sequence() {
    let server = FakeGitHub::start().await;
    server.add_run(11, None).await;
    server.queue_run_state("completed", Some("success")).await;
    server.queue_run_state("completed", Some("failure")).await;
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(server.config(dir.path()));

    let summary = DeploymentSequence::new(server.client(&config), config.clone())
        .run(&Environment::DEPLOY_SEQUENCE, true, &TriggerOptions::default())
        .await
        .unwrap();

    assert!(!summary.succeeded());
    assert_eq!(dispatched_environments(&server).await, vec!["dev", "qa"]);
    assert_eq!(summary.stages.len(), 2);
    assert!(summary.stages[0].succeeded);
    assert!(!summary.stages[1].succeeded);
    assert_eq!(summary.report.results.get(&Environment::Qa), Some(&false));
    assert_eq!(summary.report.overall_status, OverallStatus::Partial);
}

#[tokio::test]
async fn test_rejected_dispatch_aborts_sequence() {
    let server = FakeGitHub::start().await;
    server.set_dispatch_response(422, "{\"message\":\"Unexpected inputs\"}").await;
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(server.config(dir.path()));

    let err = DeploymentSequence::new(server.client(&config), config.clone())
        .run(&Environment::DEPLOY_SEQUENCE, false, &TriggerOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UnexpectedStatus { actual: 422, .. }));
    assert_eq!(dispatched_environments(&server).await, vec!["dev"]);
}

#[tokio::test]
async fn test_monitor_api_error_aborts_after_writing_report() {
    let server = FakeGitHub::start().await;
    // No run states queued: polling the run answers 404.
    server.add_run(10, None).await;
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(server.config(dir.path()));

    let err = DeploymentSequence::new(server.client(&config), config.clone())
        .run(&Environment::DEPLOY_SEQUENCE, true, &TriggerOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::GitHubApiError { status: 404, .. }));
    assert_eq!(dispatched_environments(&server).await, vec!["dev"]);

    let reports: Vec<_> = std::fs::read_dir(dir.path().join("reports"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(reports.len(), 1);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&reports[0]).unwrap()).unwrap();
    assert_eq!(report["results"]["dev"], false);
    assert_eq!(report["overall_status"], "FAILED");
}
