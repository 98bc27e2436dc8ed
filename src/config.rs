use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::application::services::monitor::PollPolicy;
use crate::error::{AppError, Result};

pub const DEFAULT_REPOSITORY: &str = "MangoMetrics/NLM";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_WORKFLOW_FILE: &str = "deploy-all-envs.yml";

/// Runtime configuration for the deployment driver.
///
/// Built from defaults, then an optional `CONFIG_FILE` (YAML or JSON), then
/// environment variables. Later layers win.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github_token: Option<String>,
    pub github_repository: String,
    pub api_base_url: String,
    pub workflow_file: String,
    pub git_ref: String,
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
    pub stage_delay_secs: u64,
    pub max_retries: u32,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            github_repository: DEFAULT_REPOSITORY.to_string(),
            api_base_url: DEFAULT_API_URL.to_string(),
            workflow_file: DEFAULT_WORKFLOW_FILE.to_string(),
            git_ref: "main".to_string(),
            poll_interval_secs: 30,
            max_poll_attempts: 60,
            stage_delay_secs: 60,
            max_retries: 10,
            output_dir: PathBuf::from("."),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "github_token",
                &self.github_token.as_ref().map(|_| "<redacted>"),
            )
            .field("github_repository", &self.github_repository)
            .field("api_base_url", &self.api_base_url)
            .field("workflow_file", &self.workflow_file)
            .field("git_ref", &self.git_ref)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("stage_delay_secs", &self.stage_delay_secs)
            .field("max_retries", &self.max_retries)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment and optional config file
    pub async fn load() -> Result<Config> {
        let mut config = Config::default();

        if let Ok(config_path) = std::env::var("CONFIG_FILE") {
            config = Self::load_from_file(&config_path).await?;
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        info!(repository = %config.github_repository, "📋 Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from file
    pub async fn load_from_file(path: &str) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::ConfigError(format!("Failed to read config file {}: {}", path, e))
        })?;

        let config: Config = if path.ends_with(".yaml") || path.ends_with(".yml") {
            serde_yaml::from_str(&content)
                .map_err(|e| AppError::ConfigError(format!("Invalid YAML config: {}", e)))?
        } else if path.ends_with(".json") {
            serde_json::from_str(&content)
                .map_err(|e| AppError::ConfigError(format!("Invalid JSON config: {}", e)))?
        } else {
            return Err(AppError::ConfigError(
                "Config file must be .yaml, .yml, or .json".to_string(),
            ));
        };

        debug!(path = path, "📁 Configuration loaded from file");
        Ok(config)
    }

    /// Overlay values from an environment lookup onto this configuration.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("GITHUB_TOKEN") {
            self.github_token = Some(token);
        }
        if let Some(repository) = lookup("GITHUB_REPOSITORY") {
            self.github_repository = repository;
        }
        if let Some(url) = lookup("GITHUB_API_URL") {
            self.api_base_url = url;
        }
        if let Some(workflow) = lookup("NLM_WORKFLOW_FILE") {
            self.workflow_file = workflow;
        }
        if let Some(git_ref) = lookup("NLM_GIT_REF") {
            self.git_ref = git_ref;
        }
        if let Some(value) = lookup("NLM_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = parse_number("NLM_POLL_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = lookup("NLM_MAX_POLL_ATTEMPTS") {
            self.max_poll_attempts = parse_number("NLM_MAX_POLL_ATTEMPTS", &value)?;
        }
        if let Some(value) = lookup("NLM_STAGE_DELAY_SECS") {
            self.stage_delay_secs = parse_number("NLM_STAGE_DELAY_SECS", &value)?;
        }
        if let Some(value) = lookup("NLM_MAX_RETRIES") {
            self.max_retries = parse_number("NLM_MAX_RETRIES", &value)?;
        }
        if let Some(dir) = lookup("NLM_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        debug!("🔧 Configuration loaded from environment variables");
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let mut parts = self.github_repository.split('/');
        let valid_repository = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
        );
        if !valid_repository {
            return Err(AppError::ConfigError(format!(
                "GitHub repository must be in format 'owner/repo', got '{}'",
                self.github_repository
            )));
        }

        url::Url::parse(&self.api_base_url).map_err(|e| {
            AppError::ConfigError(format!("Invalid GitHub API URL {}: {}", self.api_base_url, e))
        })?;

        if self.workflow_file.is_empty() {
            return Err(AppError::ConfigError(
                "Workflow file cannot be empty".to_string(),
            ));
        }
        if self.max_poll_attempts == 0 {
            return Err(AppError::ConfigError(
                "NLM_MAX_POLL_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(AppError::ConfigError(
                "NLM_MAX_RETRIES must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// The token, if one is set and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.github_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_attempts: self.max_poll_attempts,
        }
    }

    pub fn stage_delay(&self) -> Duration {
        Duration::from_secs(self.stage_delay_secs)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Link to the Actions page of a single run.
    pub fn run_url(&self, run_id: u64) -> String {
        format!(
            "https://github.com/{}/actions/runs/{}",
            self.github_repository, run_id
        )
    }

    /// Link to the Actions page of the deployment workflow.
    pub fn workflow_url(&self) -> String {
        format!(
            "https://github.com/{}/actions/workflows/{}",
            self.github_repository, self.workflow_file
        )
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::ConfigError(format!("{} must be a number, got '{}'", key, value)))
}
