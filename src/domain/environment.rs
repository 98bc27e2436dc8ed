use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// A deployment target, each backed by its own long-lived branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Qa,
    Stage,
    Prod,
}

impl Environment {
    /// Every environment, in promotion order.
    pub const ALL: [Environment; 4] = [
        Environment::Dev,
        Environment::Qa,
        Environment::Stage,
        Environment::Prod,
    ];

    /// Environments deployed by the sequence and the agent. Production is
    /// promoted separately.
    pub const DEPLOY_SEQUENCE: [Environment; 3] =
        [Environment::Dev, Environment::Qa, Environment::Stage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Qa => "qa",
            Environment::Stage => "stage",
            Environment::Prod => "prod",
        }
    }

    /// Branch that holds the code deployed to this environment.
    pub fn branch(&self) -> &'static str {
        match self {
            Environment::Prod => "main",
            other => other.as_str(),
        }
    }

    /// Test suites the deployment workflow runs for this environment.
    pub fn default_test_type(&self) -> &'static str {
        match self {
            Environment::Dev => "unit",
            Environment::Qa => "functional,integration",
            Environment::Stage => "regression,e2e",
            Environment::Prod => "smoke",
        }
    }

    fn position(&self) -> usize {
        match self {
            Environment::Dev => 0,
            Environment::Qa => 1,
            Environment::Stage => 2,
            Environment::Prod => 3,
        }
    }

    /// Environments from `start` to `target`, inclusive.
    pub fn pipeline(start: Environment, target: Environment) -> Result<Vec<Environment>> {
        let (from, to) = (start.position(), target.position());
        if from > to {
            return Err(AppError::ValidationError(format!(
                "cannot deploy backwards: {} -> {}",
                start, target
            )));
        }
        Ok(Self::ALL[from..=to].to_vec())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "qa" => Ok(Environment::Qa),
            "stage" => Ok(Environment::Stage),
            "prod" => Ok(Environment::Prod),
            _ => Err(AppError::InvalidEnvironment(s.to_string())),
        }
    }
}
