use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::{application::services::github::GitHubService, domain::Environment, error::Result};

/// Head of one environment branch.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentStatus {
    pub environment: Environment,
    pub branch: &'static str,
    /// `"<short sha> <subject>"`, or `None` when the branch is missing.
    pub head: Option<String>,
}

impl fmt::Display for EnvironmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>5}: {:>6} -> {}",
            self.environment.as_str(),
            self.branch,
            self.head.as_deref().unwrap_or("Not found")
        )
    }
}

pub struct EnvironmentStatusService {
    github: Arc<dyn GitHubService>,
}

impl EnvironmentStatusService {
    pub fn new(github: Arc<dyn GitHubService>) -> Self {
        Self { github }
    }

    pub async fn collect(&self) -> Result<Vec<EnvironmentStatus>> {
        let mut statuses = Vec::with_capacity(Environment::ALL.len());

        for environment in Environment::ALL {
            let branch = environment.branch();
            let head = self
                .github
                .get_branch_commit(branch)
                .await?
                .map(|commit| format!("{} {}", commit.short_sha(), commit.summary()));

            debug!(environment = %environment, branch = branch, head = ?head, "🔍 Branch head");
            statuses.push(EnvironmentStatus {
                environment,
                branch,
                head,
            });
        }

        Ok(statuses)
    }
}
