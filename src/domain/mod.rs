pub mod environment;
pub mod failure;

pub use environment::Environment;
pub use failure::FailureCategory;
