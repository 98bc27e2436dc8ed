use chrono::Local;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{
    application::services::{
        github::GitHubService,
        monitor::RunMonitor,
        trigger::{TriggerOptions, WorkflowTrigger},
    },
    config::Config,
    domain::{Environment, FailureCategory},
    dto::{CreateIssueRequest, WorkflowRun},
    error::Result,
    reporting::{AttemptStatus, DeploymentLog, DeploymentReport},
};

const ISSUE_DETAIL_LIMIT: usize = 500;

/// Result of analysing a failed run.
#[derive(Debug, Clone)]
pub struct FailureAnalysis {
    pub category: FailureCategory,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct EnvironmentResult {
    pub environment: Environment,
    pub succeeded: bool,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct AgentSummary {
    pub results: Vec<EnvironmentResult>,
    pub report: DeploymentReport,
}

impl AgentSummary {
    pub fn failed_environments(&self) -> Vec<Environment> {
        self.results
            .iter()
            .filter(|r| !r.succeeded)
            .map(|r| r.environment)
            .collect()
    }

    pub fn succeeded(&self) -> bool {
        self.results.iter().all(|r| r.succeeded)
    }
}

/// Deploys each environment with retries, filing a hotfix branch and an
/// issue for every failed attempt.
pub struct DeploymentAgent {
    github: Arc<dyn GitHubService>,
    trigger: WorkflowTrigger,
    monitor: RunMonitor,
    log: DeploymentLog,
    config: Arc<Config>,
}

impl DeploymentAgent {
    pub fn new(github: Arc<dyn GitHubService>, config: Arc<Config>) -> Self {
        Self {
            trigger: WorkflowTrigger::new(github.clone(), config.clone()),
            monitor: RunMonitor::new(github.clone(), config.poll_policy()),
            log: DeploymentLog::new(config.output_dir()),
            github,
            config,
        }
    }

    pub async fn run(&self) -> Result<AgentSummary> {
        let environments = Environment::DEPLOY_SEQUENCE;
        info!("🚀 Starting CI/CD Agent for {}", self.config.github_repository);
        info!(
            "Target environments: {}",
            environments.map(|e| e.as_str()).join(", ")
        );

        let mut results = Vec::new();
        for (index, environment) in environments.iter().copied().enumerate() {
            info!("{}", "=".repeat(50));
            info!("Deploying to {}", environment.as_str().to_uppercase());
            info!("{}", "=".repeat(50));

            results.push(self.deploy_environment(environment).await?);

            if index + 1 < environments.len() {
                let delay = self.config.stage_delay();
                info!(delay_secs = delay.as_secs(), "⏳ Waiting before next environment...");
                sleep(delay).await;
            }
        }

        let pairs: Vec<(Environment, bool)> =
            results.iter().map(|r| (r.environment, r.succeeded)).collect();
        let report = DeploymentReport::new(&environments, &pairs);
        if let Err(e) = report.write(self.config.output_dir()).await {
            warn!(error = %e, "⚠️ Failed to write deployment report");
        }

        let summary = AgentSummary { results, report };
        let failed = summary.failed_environments();
        if failed.is_empty() {
            info!("✅ All deployments completed successfully!");
        } else {
            let names: Vec<&str> = failed.iter().map(|e| e.as_str()).collect();
            error!("❌ Deployment completed with failures: {}", names.join(", "));
            self.log.write_final_failure_report(&failed).await?;
            info!("📧 Final failure report created. Manual notification required.");
        }

        info!("🏁 CI/CD Agent completed");
        Ok(summary)
    }

    /// Attempt one environment up to `max_retries` times.
    ///
    /// Only log-file IO errors propagate; every GitHub failure is recorded
    /// as a failed attempt.
    pub async fn deploy_environment(&self, environment: Environment) -> Result<EnvironmentResult> {
        let max_retries = self.config.max_retries;
        info!("Starting deployment to {} environment", environment.as_str().to_uppercase());

        let options = TriggerOptions::default();

        for attempt in 1..=max_retries {
            info!("Attempt {}/{} for {}", attempt, max_retries, environment);

            let run_id = match self.trigger.trigger(environment, &options).await {
                Ok(outcome) => outcome.run_id,
                Err(e) => {
                    warn!(environment = %environment, error = %e, "Failed to trigger workflow");
                    None
                }
            };

            let Some(run_id) = run_id else {
                self.log
                    .append_attempt(
                        environment,
                        attempt,
                        AttemptStatus::Failed,
                        Some("Failed to trigger workflow"),
                    )
                    .await?;
                continue;
            };

            let run = match self.monitor.wait_for_completion(run_id).await {
                Ok(outcome) if outcome.succeeded => {
                    info!("✅ Deployment to {} successful!", environment);
                    self.log
                        .append_attempt(environment, attempt, AttemptStatus::Success, None)
                        .await?;
                    return Ok(EnvironmentResult {
                        environment,
                        succeeded: true,
                        attempts: attempt,
                    });
                }
                Ok(outcome) => Some(outcome.run),
                Err(e) => {
                    error!(run_id = run_id, error = %e, "Failed to monitor workflow");
                    None
                }
            };

            let analysis = self.analyze_failure(run.as_ref()).await;
            warn!(
                "❌ Deployment to {} failed: {}",
                environment, analysis.category
            );

            let hotfix_branch = self.create_hotfix_branch(environment).await;
            let issue_url = self.create_bug_issue(environment, &analysis).await;

            let details = format!(
                "Issue type: {}, Issue: {}, Branch: {}",
                analysis.category,
                issue_url.as_deref().unwrap_or("None"),
                hotfix_branch.as_deref().unwrap_or("None")
            );
            self.log
                .append_attempt(environment, attempt, AttemptStatus::Failed, Some(&details))
                .await?;
        }

        error!("❌ All {} attempts failed for {}", max_retries, environment);
        Ok(EnvironmentResult {
            environment,
            succeeded: false,
            attempts: max_retries,
        })
    }

    /// Classify a failed run from its logs.
    pub async fn analyze_failure(&self, run: Option<&WorkflowRun>) -> FailureAnalysis {
        let Some(run) = run else {
            return FailureAnalysis {
                category: FailureCategory::Unknown,
                details: "No run data available".to_string(),
            };
        };

        match self.github.get_workflow_run_logs(run.id).await {
            Ok(logs) => FailureAnalysis {
                category: FailureCategory::classify(&logs),
                details: logs,
            },
            Err(e) => FailureAnalysis {
                category: FailureCategory::Unknown,
                details: format!("Failed to get logs: {}", e),
            },
        }
    }

    /// Branch `hotfix/cicd-{env}-{YYYYMMDD}` off the head of `main`.
    pub async fn create_hotfix_branch(&self, environment: Environment) -> Option<String> {
        let branch = hotfix_branch_name(environment, &Local::now().format("%Y%m%d").to_string());

        let result: Result<()> = async {
            let sha = self.github.get_branch_sha("main").await?;
            self.github.create_branch(&branch, &sha).await
        }
        .await;

        match result {
            Ok(()) => {
                info!(branch = %branch, "🌿 Created hotfix branch");
                Some(branch)
            }
            Err(e) => {
                error!(branch = %branch, error = %e, "Failed to create hotfix branch");
                None
            }
        }
    }

    pub async fn create_bug_issue(
        &self,
        environment: Environment,
        analysis: &FailureAnalysis,
    ) -> Option<String> {
        let request = bug_issue(environment, analysis);
        match self.github.create_issue(&request).await {
            Ok(issue) => {
                info!(url = %issue.html_url, "🐛 Created GitHub issue");
                Some(issue.html_url)
            }
            Err(e) => {
                error!(error = %e, "Failed to create GitHub issue");
                None
            }
        }
    }
}

pub fn hotfix_branch_name(environment: Environment, date: &str) -> String {
    format!("hotfix/cicd-{}-{}", environment, date)
}

/// Issue filed for a failed deployment attempt.
pub fn bug_issue(environment: Environment, analysis: &FailureAnalysis) -> CreateIssueRequest {
    let env_upper = environment.as_str().to_uppercase();
    let category = analysis.category.title();
    let root_cause: String = analysis.details.chars().take(ISSUE_DETAIL_LIMIT).collect();

    let body = format!(
        "## Environment\n{env}\n\n\
         ## Issue Type\n{category}\n\n\
         ## Root Cause\n{root_cause}...\n\n\
         ## Steps to Reproduce\n\
         1. Trigger deployment to {env_lower} environment\n\
         2. Monitor workflow execution\n\
         3. Observe failure\n\n\
         ## Priority\nMedium\n\n\
         ## Labels\nbug, cicd, {env_lower}\n",
        env = env_upper,
        category = category,
        root_cause = root_cause,
        env_lower = environment,
    );

    CreateIssueRequest {
        title: format!("[AutoBug][{}] {}", env_upper, category),
        body,
        labels: vec![
            "bug".to_string(),
            "cicd".to_string(),
            environment.to_string(),
        ],
    }
}
