use std::sync::Arc;
use tracing::{error, info};

use crate::{
    application::services::github::GitHubService, domain::Environment,
    dto::BranchProtectionRequest, error::Result,
};

pub struct BranchProtector {
    github: Arc<dyn GitHubService>,
}

impl BranchProtector {
    pub fn new(github: Arc<dyn GitHubService>) -> Self {
        Self { github }
    }

    /// Apply the fixed policy to every environment branch. Stops at the
    /// first failure.
    pub async fn protect_all(&self) -> Result<Vec<String>> {
        let request = BranchProtectionRequest::default();
        let mut protected = Vec::with_capacity(Environment::ALL.len());

        // Protection targets the branch named after each environment,
        // including a literal `prod` branch.
        for branch in Environment::ALL.map(|env| env.as_str()) {
            info!(branch = branch, "🔒 Protecting branch");
            if let Err(e) = self.github.protect_branch(branch, &request).await {
                error!(branch = branch, error = %e, "❌ Failed to protect branch");
                return Err(e);
            }
            info!(branch = branch, "✅ Branch protected");
            protected.push(branch.to_string());
        }

        Ok(protected)
    }
}
