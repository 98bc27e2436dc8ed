pub mod agent;
pub mod branch_protection;
pub mod github;
pub mod monitor;
pub mod sequence;
pub mod setup;
pub mod status;
pub mod trigger;

// Re-export commonly used services
pub use agent::DeploymentAgent;
pub use branch_protection::BranchProtector;
pub use github::GitHubService;
pub use monitor::{PollPolicy, RunMonitor};
pub use sequence::DeploymentSequence;
pub use status::EnvironmentStatusService;
pub use trigger::{TriggerOptions, WorkflowTrigger};
