use crate::common::*;
use nlm_cicd::{
    application::services::{TriggerOptions, WorkflowTrigger},
    infrastructure::GitHubClient,
    AppError, Config, Environment,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_dispatch_sends_payload_and_token() {
    let server = FakeGitHub::start().await;
    server
        .add_run(4242, Some("https://github.com/acme/nlm/actions/runs/4242"))
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(server.config(dir.path()));

    let outcome = WorkflowTrigger::new(server.client(&config), config.clone())
        .trigger(Environment::Qa, &TriggerOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.run_id, Some(4242));
    assert_eq!(outcome.test_type, "functional,integration");
    assert_eq!(
        outcome.monitor_url,
        "https://github.com/acme/nlm/actions/runs/4242"
    );

    let dispatches = server
        .calls_to("POST", "actions/workflows/deploy-all-envs.yml/dispatches")
        .await;
    assert_eq!(dispatches.len(), 1);
    assert_eq!(
        dispatches[0].authorization.as_deref(),
        Some("Bearer test-token")
    );
    assert_eq!(
        dispatches[0].body,
        Some(json!({
            "ref": "main",
            "inputs": {
                "environment": "qa",
                "test_type": "functional,integration",
                "run_tests": "true",
                "deploy_latest": "true"
            }
        }))
    );

    let listing = server.calls_to("GET", "actions/runs").await;
    assert_eq!(listing[0].query.as_deref(), Some("per_page=1"));
}

#[tokio::test]
async fn test_dispatch_options_override_defaults() {
    let server = FakeGitHub::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(server.config(dir.path()));

    let options = TriggerOptions {
        test_type: Some("smoke".to_string()),
        run_tests: false,
        deploy_latest: false,
    };
    let outcome = WorkflowTrigger::new(server.client(&config), config.clone())
        .trigger(Environment::Prod, &options)
        .await
        .unwrap();

    // No runs listed yet: fall back to the workflow page.
    assert_eq!(outcome.run_id, None);
    assert_eq!(
        outcome.monitor_url,
        "https://github.com/acme/nlm/actions/workflows/deploy-all-envs.yml"
    );

    let body = server.calls_to("POST", "actions/workflows").await[0]
        .body
        .clone()
        .unwrap();
    assert_eq!(body["inputs"]["environment"], "prod");
    assert_eq!(body["inputs"]["test_type"], "smoke");
    assert_eq!(body["inputs"]["run_tests"], "false");
    assert_eq!(body["inputs"]["deploy_latest"], "false");
}

#[tokio::test]
async fn test_dispatch_requires_204() {
    for (status, body) in [(200, "{}"), (401, "{\"message\":\"Bad credentials\"}")] {
        let server = FakeGitHub::start().await;
        server.set_dispatch_response(status, body).await;
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(server.config(dir.path()));

        let err = WorkflowTrigger::new(server.client(&config), config.clone())
            .trigger(Environment::Dev, &TriggerOptions::default())
            .await
            .unwrap_err();

        match err {
            AppError::UnexpectedStatus {
                expected,
                actual,
                body: response,
            } => {
                assert_eq!(expected, 204);
                assert_eq!(actual, status);
                assert_eq!(response, body);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // No run lookup after a rejected dispatch.
        assert!(server.calls_to("GET", "actions/runs").await.is_empty());
    }
}

#[tokio::test]
async fn test_missing_token_makes_no_requests() {
    let server = FakeGitHub::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        github_token: Some("   ".to_string()),
        ..server.config(dir.path())
    };

    let result = GitHubClient::from_config(Arc::new(reqwest::Client::new()), &config);

    assert!(matches!(result, Err(AppError::MissingToken)));
    assert!(server.calls().await.is_empty());
}

#[tokio::test]
async fn test_authenticated_user() {
    let server = FakeGitHub::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = server.config(dir.path());

    let user = server
        .client(&config)
        .get_authenticated_user()
        .await
        .unwrap();

    assert_eq!(user.login, "deploy-bot");
    assert_eq!(server.calls().await[0].endpoint(), "GET /user");
}

#[tokio::test]
async fn test_malformed_success_body_is_a_serialization_error() {
    let server = FakeGitHub::start().await;
    server.set_raw_user_body("<html>maintenance</html>").await;
    let dir = tempfile::tempdir().unwrap();
    let config = server.config(dir.path());

    let err = server
        .client(&config)
        .get_authenticated_user()
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::SerializationError(_)));
}
