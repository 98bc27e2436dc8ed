use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /repos/{owner}/{repo}/actions/workflows/{workflow}/dispatches`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDispatchRequest {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub inputs: DispatchInputs,
}

/// Workflow inputs. GitHub passes every dispatch input as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchInputs {
    pub environment: String,
    pub test_type: String,
    pub run_tests: String,
    pub deploy_latest: String,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowRunsResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub status: RunStatus,
    pub conclusion: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl WorkflowRun {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn succeeded(&self) -> bool {
        self.is_completed() && self.conclusion.as_deref() == Some("success")
    }
}

/// Lifecycle state of a workflow run as reported by GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Waiting,
    Requested,
    Pending,
    Other(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Waiting => "waiting",
            RunStatus::Requested => "requested",
            RunStatus::Pending => "pending",
            RunStatus::Other(other) => other,
        }
    }
}

impl From<&str> for RunStatus {
    fn from(value: &str) -> Self {
        match value {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "completed" => RunStatus::Completed,
            "waiting" => RunStatus::Waiting,
            "requested" => RunStatus::Requested,
            "pending" => RunStatus::Pending,
            other => RunStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RunStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RunStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(RunStatus::from(value.as_str()))
    }
}

/// Fixed protection policy applied to every environment branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchProtectionRequest {
    pub required_status_checks: RequiredStatusChecks,
    pub enforce_admins: bool,
    pub required_pull_request_reviews: RequiredPullRequestReviews,
    /// Always serialized as `null`: no push restrictions.
    pub restrictions: Option<()>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequiredStatusChecks {
    pub strict: bool,
    pub contexts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequiredPullRequestReviews {
    pub required_approving_review_count: u32,
    pub dismiss_stale_reviews: bool,
}

impl Default for BranchProtectionRequest {
    fn default() -> Self {
        Self {
            required_status_checks: RequiredStatusChecks {
                strict: true,
                contexts: Vec::new(),
            },
            enforce_admins: false,
            required_pull_request_reviews: RequiredPullRequestReviews {
                required_approving_review_count: 1,
                dismiss_stale_reviews: true,
            },
            restrictions: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub object: GitObject,
}

#[derive(Debug, Deserialize)]
pub struct GitObject {
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRefRequest {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateIssueRequest {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GitHubIssue {
    pub number: u64,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Subset of `GET /repos/{owner}/{repo}/commits/{ref}`.
#[derive(Debug, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
    pub commit: CommitDetails,
}

#[derive(Debug, Deserialize)]
pub struct CommitDetails {
    pub message: String,
}

impl BranchCommit {
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }

    pub fn summary(&self) -> &str {
        self.commit.message.lines().next().unwrap_or("")
    }
}
