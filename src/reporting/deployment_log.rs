use chrono::Local;
use std::fmt;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::domain::Environment;
use crate::error::Result;

pub const FINAL_REPORT_FILE: &str = "FINAL_FAILURE_REPORT.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Success,
    Failed,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStatus::Success => f.write_str("SUCCESS"),
            AttemptStatus::Failed => f.write_str("FAILED"),
        }
    }
}

/// Per-environment markdown logs of deployment attempts.
#[derive(Debug, Clone)]
pub struct DeploymentLog {
    output_dir: PathBuf,
}

impl DeploymentLog {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, environment: Environment) -> PathBuf {
        self.output_dir
            .join(format!("deployment_log_{}.md", environment))
    }

    /// Append one attempt block to the environment's log.
    pub async fn append_attempt(
        &self,
        environment: Environment,
        attempt: u32,
        status: AttemptStatus,
        details: Option<&str>,
    ) -> Result<()> {
        fs::create_dir_all(&self.output_dir).await?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut entry = format!("## Attempt {} - {}\n", attempt, timestamp);
        entry.push_str(&format!("**Status:** {}\n", status));
        if let Some(details) = details.filter(|d| !d.is_empty()) {
            entry.push_str(&format!("**Details:** {}\n", details));
        }
        entry.push_str("\n---\n\n");

        let path = self.path_for(environment);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %path.display(), attempt = attempt, status = %status, "📝 Logged deployment attempt");
        Ok(())
    }

    /// Contents of the environment's log, if it has been written.
    pub async fn read(&self, environment: Environment) -> Result<Option<String>> {
        let path = self.path_for(environment);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `FINAL_FAILURE_REPORT.md` embedding the log of each failed environment.
    pub async fn write_final_failure_report(&self, failed: &[Environment]) -> Result<PathBuf> {
        let names: Vec<&str> = failed.iter().map(|env| env.as_str()).collect();

        let mut report = String::from("# FINAL FAILURE REPORT - CI/CD Deployment\n\n");
        report.push_str("## Summary\n");
        report.push_str(&format!(
            "Deployment failed for the following environments: {}\n\n",
            names.join(", ")
        ));
        report.push_str("## Failed Environments\n");

        for environment in failed {
            if let Some(log) = self.read(*environment).await? {
                report.push_str(&format!(
                    "\n### {}\n{}\n",
                    environment.as_str().to_uppercase(),
                    log
                ));
            }
        }

        report.push_str(
            "\n## Recommendations\n\
             1. Review all GitHub issues created during deployment\n\
             2. Check hotfix branches for potential fixes\n\
             3. Verify GitHub Actions workflow configuration\n\
             4. Review test suite for flaky tests\n\
             5. Consider infrastructure improvements\n\
             \n## Next Steps\n\
             - Manual intervention required\n\
             - Review logs in deployment_log_*.md files\n\
             - Check GitHub issues for detailed analysis\n\
             - Consider rolling back recent changes if necessary\n",
        );
        report.push_str(&format!(
            "\nGenerated: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(FINAL_REPORT_FILE);
        fs::write(&path, report).await?;

        info!(path = %path.display(), "📄 Created final failure report");
        Ok(path)
    }
}
