use serde::Serialize;
use std::fmt;

/// Coarse cause of a failed deployment run, inferred from its logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    TestFailure,
    DependencyError,
    CiMisconfiguration,
    CodeDefect,
    InfrastructureError,
    Unknown,
}

impl FailureCategory {
    /// Classify run logs. Rules are checked in order and the first match wins.
    pub fn classify(logs: &str) -> Self {
        let logs = logs.to_lowercase();
        let any = |needles: &[&str]| needles.iter().any(|n| logs.contains(n));

        if any(&["test failure", "assertion"]) {
            FailureCategory::TestFailure
        } else if any(&["dependency", "package"]) {
            FailureCategory::DependencyError
        } else if any(&["configuration", "yaml"]) {
            FailureCategory::CiMisconfiguration
        } else if any(&["code", "syntax"]) {
            FailureCategory::CodeDefect
        } else {
            FailureCategory::InfrastructureError
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::TestFailure => "test_failure",
            FailureCategory::DependencyError => "dependency_error",
            FailureCategory::CiMisconfiguration => "ci_misconfiguration",
            FailureCategory::CodeDefect => "code_defect",
            FailureCategory::InfrastructureError => "infrastructure_error",
            FailureCategory::Unknown => "unknown",
        }
    }

    /// Human-readable form, e.g. `Ci Misconfiguration`.
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
