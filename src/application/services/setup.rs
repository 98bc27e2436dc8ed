use crate::config::Config;

/// Outcome of the local setup check. Makes no network calls.
#[derive(Debug, Clone)]
pub struct SetupReport {
    pub token_present: bool,
    pub repository: String,
    pub workflow_file: String,
    pub guidance: Vec<String>,
}

impl SetupReport {
    pub fn is_ready(&self) -> bool {
        self.token_present
    }
}

pub fn check_setup(config: &Config) -> SetupReport {
    let token_present = config.token().is_some();

    let guidance = if token_present {
        vec![
            format!("GitHub token found. Deployments target {}.", config.github_repository),
            format!(
                "Trigger a single environment: nlm-cicd trigger --environment dev (workflow {})",
                config.workflow_file
            ),
            "Deploy dev, qa and stage in sequence: nlm-cicd deploy --monitor".to_string(),
        ]
    } else {
        vec![
            "GITHUB_TOKEN is not set.".to_string(),
            "1. Create a personal access token at https://github.com/settings/tokens".to_string(),
            "2. Grant it the 'repo' and 'workflow' scopes".to_string(),
            "3. Export it: export GITHUB_TOKEN=<your token>".to_string(),
            format!(
                "4. Optionally set GITHUB_REPOSITORY (currently {})",
                config.github_repository
            ),
            "5. Re-run: nlm-cicd setup --verify".to_string(),
        ]
    };

    SetupReport {
        token_present,
        repository: config.github_repository.clone(),
        workflow_file: config.workflow_file.clone(),
        guidance,
    }
}
