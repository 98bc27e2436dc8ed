use async_trait::async_trait;

use crate::{
    dto::{
        BranchCommit, BranchProtectionRequest, CreateIssueRequest, GitHubIssue, GitHubUser,
        WorkflowDispatchRequest, WorkflowRun,
    },
    error::Result,
};

/// Operations the deployment driver needs from the GitHub REST API.
///
/// Every call is scoped to the single configured repository.
#[async_trait]
pub trait GitHubService: Send + Sync {
    /// `GET /user`
    async fn get_authenticated_user(&self) -> Result<GitHubUser>;

    /// Dispatch `workflow`. Succeeds only on HTTP 204.
    async fn dispatch_workflow(
        &self,
        workflow: &str,
        request: &WorkflowDispatchRequest,
    ) -> Result<()>;

    /// Most recent workflow run in the repository, if any.
    async fn get_latest_workflow_run(&self) -> Result<Option<WorkflowRun>>;

    async fn get_workflow_run(&self, run_id: u64) -> Result<WorkflowRun>;

    /// Raw log archive for a run, decoded lossily as text.
    async fn get_workflow_run_logs(&self, run_id: u64) -> Result<String>;

    /// SHA the branch head points at.
    async fn get_branch_sha(&self, branch: &str) -> Result<String>;

    /// Create `refs/heads/{branch}` at `sha`.
    async fn create_branch(&self, branch: &str, sha: &str) -> Result<()>;

    async fn create_issue(&self, request: &CreateIssueRequest) -> Result<GitHubIssue>;

    async fn protect_branch(
        &self,
        branch: &str,
        request: &BranchProtectionRequest,
    ) -> Result<()>;

    /// Head commit of `branch`, or `None` when the branch does not exist.
    async fn get_branch_commit(&self, branch: &str) -> Result<Option<BranchCommit>>;
}
