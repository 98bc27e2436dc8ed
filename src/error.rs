#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("GITHUB_TOKEN is not set")]
    MissingToken,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("GitHub API error ({status}): {message}")]
    GitHubApiError { status: u16, message: String },

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Unexpected HTTP status {actual} (expected {expected}): {body}")]
    UnexpectedStatus {
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("Timed out waiting for workflow run {run_id} after {attempts} attempts")]
    MonitorTimeout { run_id: u64, attempts: u32 },

    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl AppError {
    /// Process exit code reported by the CLI for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::ConfigError(format!("YAML error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
