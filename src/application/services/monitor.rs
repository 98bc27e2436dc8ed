use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    application::services::github::GitHubService,
    dto::WorkflowRun,
    error::{AppError, Result},
};

/// How often, and how many times, a workflow run is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_attempts: 60,
        }
    }
}

/// Terminal state of a monitored run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run: WorkflowRun,
    pub succeeded: bool,
    pub attempts: u32,
}

/// Polls a workflow run until GitHub reports it `completed`.
pub struct RunMonitor {
    github: Arc<dyn GitHubService>,
    policy: PollPolicy,
}

impl RunMonitor {
    pub fn new(github: Arc<dyn GitHubService>, policy: PollPolicy) -> Self {
        Self { github, policy }
    }

    /// Poll `run_id` until it completes or the attempt ceiling is reached.
    ///
    /// API errors abort immediately. After `max_attempts` polls without a
    /// terminal status this returns [`AppError::MonitorTimeout`].
    pub async fn wait_for_completion(&self, run_id: u64) -> Result<RunOutcome> {
        info!(
            run_id = run_id,
            interval_secs = self.policy.interval.as_secs(),
            max_attempts = self.policy.max_attempts,
            "👀 Monitoring workflow run"
        );

        for attempt in 1..=self.policy.max_attempts {
            let run = self.github.get_workflow_run(run_id).await?;

            info!(
                run_id = run_id,
                attempt = attempt,
                status = %run.status,
                conclusion = run.conclusion.as_deref().unwrap_or("none"),
                "Workflow status: {}, conclusion: {}",
                run.status,
                run.conclusion.as_deref().unwrap_or("none")
            );

            if run.is_completed() {
                let succeeded = run.succeeded();
                if succeeded {
                    info!(run_id = run_id, "✅ Workflow run succeeded");
                } else {
                    warn!(
                        run_id = run_id,
                        conclusion = run.conclusion.as_deref().unwrap_or("none"),
                        "❌ Workflow run did not succeed"
                    );
                }
                return Ok(RunOutcome {
                    run,
                    succeeded,
                    attempts: attempt,
                });
            }

            if attempt < self.policy.max_attempts {
                debug!(delay_secs = self.policy.interval.as_secs(), "⏳ Waiting before next poll");
                sleep(self.policy.interval).await;
            }
        }

        warn!(
            run_id = run_id,
            attempts = self.policy.max_attempts,
            "⏰ Timed out waiting for workflow run"
        );
        Err(AppError::MonitorTimeout {
            run_id,
            attempts: self.policy.max_attempts,
        })
    }
}
