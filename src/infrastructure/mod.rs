pub mod github_client;

pub use github_client::{build_http_client, GitHubClient};
