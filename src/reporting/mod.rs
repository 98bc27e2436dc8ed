pub mod deployment_log;
pub mod report;

pub use deployment_log::{AttemptStatus, DeploymentLog};
pub use report::{DeploymentReport, OverallStatus};
