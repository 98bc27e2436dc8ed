use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    application::services::github::GitHubService,
    config::Config,
    domain::Environment,
    dto::{DispatchInputs, WorkflowDispatchRequest},
    error::Result,
};

/// Caller-supplied workflow inputs beyond the environment itself.
#[derive(Debug, Clone)]
pub struct TriggerOptions {
    /// Overrides [`Environment::default_test_type`] when set.
    pub test_type: Option<String>,
    pub run_tests: bool,
    pub deploy_latest: bool,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self {
            test_type: None,
            run_tests: true,
            deploy_latest: true,
        }
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub environment: Environment,
    pub test_type: String,
    /// Id of the newest run after the dispatch. `None` when GitHub listed no runs.
    pub run_id: Option<u64>,
    pub monitor_url: String,
}

/// Dispatches the deployment workflow for one environment.
pub struct WorkflowTrigger {
    github: Arc<dyn GitHubService>,
    config: Arc<Config>,
}

impl WorkflowTrigger {
    pub fn new(github: Arc<dyn GitHubService>, config: Arc<Config>) -> Self {
        Self { github, config }
    }

    pub fn build_request(
        &self,
        environment: Environment,
        options: &TriggerOptions,
    ) -> WorkflowDispatchRequest {
        let test_type = options
            .test_type
            .clone()
            .unwrap_or_else(|| environment.default_test_type().to_string());

        WorkflowDispatchRequest {
            git_ref: self.config.git_ref.clone(),
            inputs: DispatchInputs {
                environment: environment.to_string(),
                test_type,
                run_tests: options.run_tests.to_string(),
                deploy_latest: options.deploy_latest.to_string(),
            },
        }
    }

    /// Dispatch the workflow and look up the run it created.
    ///
    /// Anything other than HTTP 204 from the dispatch endpoint is an error.
    pub async fn trigger(
        &self,
        environment: Environment,
        options: &TriggerOptions,
    ) -> Result<DispatchOutcome> {
        let request = self.build_request(environment, options);
        info!(
            environment = %environment,
            test_type = %request.inputs.test_type,
            workflow = %self.config.workflow_file,
            "🚀 Triggering deployment workflow"
        );

        if let Err(e) = self
            .github
            .dispatch_workflow(&self.config.workflow_file, &request)
            .await
        {
            error!(environment = %environment, error = %e, "❌ Failed to trigger workflow");
            return Err(e);
        }

        info!(environment = %environment, "✅ Workflow dispatched");

        let latest = self.github.get_latest_workflow_run().await?;
        let (run_id, monitor_url) = match latest {
            Some(run) => {
                let url = run
                    .html_url
                    .clone()
                    .unwrap_or_else(|| self.config.run_url(run.id));
                (Some(run.id), url)
            }
            None => {
                warn!(environment = %environment, "⚠️ No workflow runs found after dispatch");
                (None, self.config.workflow_url())
            }
        };

        info!(
            environment = %environment,
            run_id = ?run_id,
            url = %monitor_url,
            "🔗 Monitor the deployment"
        );

        Ok(DispatchOutcome {
            environment,
            test_type: request.inputs.test_type,
            run_id,
            monitor_url,
        })
    }
}
