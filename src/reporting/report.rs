use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::Environment;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    Success,
    Partial,
    Failed,
}

/// JSON summary written after a deployment sequence or agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub deployment_id: String,
    pub timestamp: DateTime<Utc>,
    pub environments: Vec<Environment>,
    pub results: BTreeMap<Environment, bool>,
    pub success_rate: f64,
    pub overall_status: OverallStatus,
}

impl DeploymentReport {
    pub fn new(environments: &[Environment], results: &[(Environment, bool)]) -> Self {
        Self::at(Utc::now(), environments, results)
    }

    pub fn at(
        timestamp: DateTime<Utc>,
        environments: &[Environment],
        results: &[(Environment, bool)],
    ) -> Self {
        let results: BTreeMap<Environment, bool> = results.iter().copied().collect();
        let passed = results.values().filter(|ok| **ok).count();

        let success_rate = if results.is_empty() {
            0.0
        } else {
            passed as f64 / results.len() as f64
        };

        let overall_status = if !results.is_empty() && passed == results.len() {
            OverallStatus::Success
        } else if passed > 0 {
            OverallStatus::Partial
        } else {
            OverallStatus::Failed
        };

        Self {
            deployment_id: format!("deploy_{}", timestamp.timestamp()),
            timestamp,
            environments: environments.to_vec(),
            results,
            success_rate,
            overall_status,
        }
    }

    /// Save under `<output_dir>/reports/deployment_report_<id>.json`.
    pub async fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        let reports_dir = output_dir.join("reports");
        tokio::fs::create_dir_all(&reports_dir).await?;

        let path = reports_dir.join(format!("deployment_report_{}.json", self.deployment_id));
        let body = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, body).await?;

        info!(path = %path.display(), status = ?self.overall_status, "📊 Deployment report saved");
        Ok(path)
    }
}
