use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{
    application::services::{
        github::GitHubService,
        monitor::RunMonitor,
        trigger::{DispatchOutcome, TriggerOptions, WorkflowTrigger},
    },
    config::Config,
    domain::Environment,
    error::{AppError, Result},
    reporting::DeploymentReport,
};

/// What happened to one stage of the sequence.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub environment: Environment,
    pub dispatch: DispatchOutcome,
    /// `None` when the stage was not monitored.
    pub conclusion: Option<String>,
    pub succeeded: bool,
}

#[derive(Debug, Clone)]
pub struct SequenceSummary {
    pub stages: Vec<StageResult>,
    pub report: DeploymentReport,
}

impl SequenceSummary {
    /// Every planned stage ran and succeeded.
    pub fn succeeded(&self) -> bool {
        self.stages.len() == self.report.environments.len()
            && self.stages.iter().all(|stage| stage.succeeded)
    }
}

/// Triggers a run of environments in order with a fixed delay between stages.
pub struct DeploymentSequence {
    trigger: WorkflowTrigger,
    monitor: RunMonitor,
    config: Arc<Config>,
}

impl DeploymentSequence {
    pub fn new(github: Arc<dyn GitHubService>, config: Arc<Config>) -> Self {
        Self {
            trigger: WorkflowTrigger::new(github.clone(), config.clone()),
            monitor: RunMonitor::new(github, config.poll_policy()),
            config,
        }
    }

    /// Deploy `environments` in order, usually [`Environment::DEPLOY_SEQUENCE`]
    /// or a slice from [`Environment::pipeline`].
    ///
    /// A failed trigger, or an API error while monitoring, aborts the
    /// sequence with its error after the report is written. With `monitor`
    /// set, a run that does not succeed (or times out) stops the sequence
    /// and is reported as a failed stage.
    pub async fn run(
        &self,
        environments: &[Environment],
        monitor: bool,
        options: &TriggerOptions,
    ) -> Result<SequenceSummary> {
        if environments.is_empty() {
            return Err(AppError::ValidationError(
                "no environments to deploy".to_string(),
            ));
        }
        info!(
            environments = ?environments.iter().map(|e| e.as_str()).collect::<Vec<_>>(),
            monitor = monitor,
            "🎯 Starting deployment sequence"
        );

        let mut stages: Vec<StageResult> = Vec::new();

        for (index, environment) in environments.iter().copied().enumerate() {
            info!("{}", "=".repeat(50));
            info!("Deploying to {}", environment.as_str().to_uppercase());
            info!("{}", "=".repeat(50));

            let dispatch = match self.trigger.trigger(environment, options).await {
                Ok(dispatch) => dispatch,
                Err(e) => {
                    error!(environment = %environment, error = %e, "❌ Deployment sequence aborted");
                    self.abort(environments, &stages, environment).await;
                    return Err(e);
                }
            };

            let stage = if monitor {
                match self.monitor_stage(environment, dispatch).await {
                    Ok(stage) => stage,
                    Err(e) => {
                        error!(environment = %environment, error = %e, "❌ Failed to monitor workflow");
                        self.abort(environments, &stages, environment).await;
                        return Err(e);
                    }
                }
            } else {
                StageResult {
                    environment,
                    dispatch,
                    conclusion: None,
                    succeeded: true,
                }
            };

            let succeeded = stage.succeeded;
            stages.push(stage);

            if !succeeded {
                error!(environment = %environment, "❌ Deployment sequence stopped at {}", environment);
                break;
            }

            if index + 1 < environments.len() {
                let delay = self.config.stage_delay();
                info!(delay_secs = delay.as_secs(), "⏳ Waiting before next environment...");
                sleep(delay).await;
            }
        }

        let report = self
            .write_report(environments, &Self::results_of(&stages))
            .await;

        Ok(SequenceSummary { stages, report })
    }

    async fn monitor_stage(
        &self,
        environment: Environment,
        dispatch: DispatchOutcome,
    ) -> Result<StageResult> {
        let Some(run_id) = dispatch.run_id else {
            warn!(environment = %environment, "⚠️ No run id to monitor");
            return Ok(StageResult {
                environment,
                dispatch,
                conclusion: None,
                succeeded: false,
            });
        };

        match self.monitor.wait_for_completion(run_id).await {
            Ok(outcome) => Ok(StageResult {
                environment,
                dispatch,
                conclusion: outcome.run.conclusion,
                succeeded: outcome.succeeded,
            }),
            Err(AppError::MonitorTimeout { run_id, attempts }) => {
                warn!(
                    environment = %environment,
                    run_id = run_id,
                    attempts = attempts,
                    "⏰ Monitoring timed out"
                );
                Ok(StageResult {
                    environment,
                    dispatch,
                    conclusion: None,
                    succeeded: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    fn results_of(stages: &[StageResult]) -> Vec<(Environment, bool)> {
        stages
            .iter()
            .map(|stage| (stage.environment, stage.succeeded))
            .collect()
    }

    /// Report the completed stages plus `failed` as a failure.
    async fn abort(&self, environments: &[Environment], stages: &[StageResult], failed: Environment) {
        let mut results = Self::results_of(stages);
        results.push((failed, false));
        self.write_report(environments, &results).await;
    }

    async fn write_report(
        &self,
        environments: &[Environment],
        results: &[(Environment, bool)],
    ) -> DeploymentReport {
        let report = DeploymentReport::new(environments, results);
        if let Err(e) = report.write(self.config.output_dir()).await {
            warn!(error = %e, "⚠️ Failed to write deployment report");
        }
        report
    }
}
