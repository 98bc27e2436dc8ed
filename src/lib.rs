//! nlm-cicd - deployment driver for the NLM load-testing application
//!
//! Dispatches the GitHub Actions deployment workflow for each environment,
//! monitors the resulting runs, protects environment branches and keeps
//! deployment logs and reports.

pub mod application;
pub mod config;
pub mod domain;
pub mod dto;
pub mod error;
pub mod infrastructure;
pub mod reporting;

// Re-export commonly used types
pub use config::Config;
pub use domain::Environment;
pub use error::{AppError, Result};
