// Integration tests against an in-process fake of the GitHub REST API.
#[path = "../common/mod.rs"]
mod common;

mod deployment_agent_tests;
mod deployment_sequence_tests;
mod monitor_tests;
mod trigger_tests;
