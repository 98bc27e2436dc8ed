use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Client, Response, StatusCode,
};
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::{
    application::services::github::GitHubService,
    config::Config,
    dto::{
        BranchCommit, BranchProtectionRequest, CreateIssueRequest, CreateRefRequest, GitHubIssue,
        GitHubUser, GitRef, WorkflowDispatchRequest, WorkflowRun, WorkflowRunsResponse,
    },
    error::{AppError, Result},
};

const CLIENT_USER_AGENT: &str = concat!("nlm-cicd/", env!("CARGO_PKG_VERSION"));
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Build the shared HTTP client.
pub fn build_http_client() -> Result<Arc<Client>> {
    let client = Client::builder()
        .user_agent(CLIENT_USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| AppError::HttpError(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Arc::new(client))
}

/// Text of a run's logs. Zip archives are unpacked and each file is emitted
/// under a `==> name <==` header; anything else is read as lossy UTF-8.
pub fn extract_log_text(bytes: &[u8]) -> Result<String> {
    if !bytes.starts_with(ZIP_MAGIC) {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::SerializationError(format!("Invalid log archive: {}", e)))?;

    let mut text = String::new();
    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|e| AppError::SerializationError(format!("Invalid log archive: {}", e)))?;
        if file.is_dir() {
            continue;
        }

        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        text.push_str(&format!("==> {} <==\n", file.name()));
        text.push_str(&String::from_utf8_lossy(&content));
        text.push('\n');
    }

    debug!(files = archive.len(), "📦 Unpacked workflow log archive");
    Ok(text)
}

/// reqwest-backed [`GitHubService`] bound to one repository and token.
pub struct GitHubClient {
    http_client: Arc<Client>,
    base_url: String,
    repository: String,
    headers: HeaderMap,
}

impl GitHubClient {
    /// Fails with [`AppError::MissingToken`] before any request is made when
    /// no token is configured.
    pub fn from_config(http_client: Arc<Client>, config: &Config) -> Result<Self> {
        let token = config.token().ok_or(AppError::MissingToken)?;

        Ok(Self {
            http_client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            repository: config.github_repository.clone(),
            headers: Self::create_headers(token)?,
        })
    }

    fn create_headers(access_token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|_| AppError::ConfigError("GITHUB_TOKEN contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        Ok(headers)
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}", self.base_url, self.repository, path)
    }

    async fn handle_github_response<T>(&self, response: Response) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = Self::ensure_success(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::SerializationError(format!("Failed to parse GitHub response: {}", e)))
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(AppError::GitHubApiError {
            status: status.as_u16(),
            message: error_text,
        })
    }
}

#[async_trait]
impl GitHubService for GitHubClient {
    async fn get_authenticated_user(&self) -> Result<GitHubUser> {
        let url = format!("{}/user", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        self.handle_github_response(response).await
    }

    async fn dispatch_workflow(
        &self,
        workflow: &str,
        request: &WorkflowDispatchRequest,
    ) -> Result<()> {
        let url = self.repo_url(&format!("actions/workflows/{}/dispatches", workflow));
        debug!(url = %url, environment = %request.inputs.environment, "📤 Dispatching workflow");

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UnexpectedStatus {
                expected: StatusCode::NO_CONTENT.as_u16(),
                actual: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    async fn get_latest_workflow_run(&self) -> Result<Option<WorkflowRun>> {
        let url = self.repo_url("actions/runs");

        let response = self
            .http_client
            .get(&url)
            .headers(self.headers.clone())
            .query(&[("per_page", "1")])
            .send()
            .await?;

        let runs: WorkflowRunsResponse = self.handle_github_response(response).await?;
        Ok(runs.workflow_runs.into_iter().next())
    }

    async fn get_workflow_run(&self, run_id: u64) -> Result<WorkflowRun> {
        let url = self.repo_url(&format!("actions/runs/{}", run_id));

        let response = self
            .http_client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        self.handle_github_response(response).await
    }

    async fn get_workflow_run_logs(&self, run_id: u64) -> Result<String> {
        let url = self.repo_url(&format!("actions/runs/{}/logs", run_id));

        let response = self
            .http_client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        // GitHub redirects to a zip archive; reqwest follows the redirect.
        let bytes = Self::ensure_success(response).await?.bytes().await?;
        extract_log_text(&bytes)
    }

    async fn get_branch_sha(&self, branch: &str) -> Result<String> {
        let url = self.repo_url(&format!("git/ref/heads/{}", branch));

        let response = self
            .http_client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        let git_ref: GitRef = self.handle_github_response(response).await?;
        Ok(git_ref.object.sha)
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> Result<()> {
        let url = self.repo_url("git/refs");
        let body = CreateRefRequest {
            git_ref: format!("refs/heads/{}", branch),
            sha: sha.to_string(),
        };

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn create_issue(&self, request: &CreateIssueRequest) -> Result<GitHubIssue> {
        let url = self.repo_url("issues");

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await?;

        self.handle_github_response(response).await
    }

    async fn protect_branch(
        &self,
        branch: &str,
        request: &BranchProtectionRequest,
    ) -> Result<()> {
        let url = self.repo_url(&format!(
            "branches/{}/protection",
            urlencoding::encode(branch)
        ));

        let response = self
            .http_client
            .put(&url)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn get_branch_commit(&self, branch: &str) -> Result<Option<BranchCommit>> {
        let url = self.repo_url(&format!("commits/{}", urlencoding::encode(branch)));

        let response = self
            .http_client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY
        ) {
            return Ok(None);
        }

        self.handle_github_response(response).await.map(Some)
    }
}
