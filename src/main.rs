use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nlm_cicd::{
    application::services::{
        setup::check_setup, BranchProtector, DeploymentAgent, DeploymentSequence,
        EnvironmentStatusService, GitHubService, RunMonitor, TriggerOptions, WorkflowTrigger,
    },
    infrastructure::{build_http_client, GitHubClient},
    AppError, Config, Environment, Result,
};

#[derive(Parser, Debug)]
#[command(
    name = "nlm-cicd",
    version,
    about = "Deploy the NLM load-testing application through GitHub Actions"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository as owner/name (overrides GITHUB_REPOSITORY)
    #[arg(long, global = true, value_name = "OWNER/NAME")]
    repository: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that a GitHub token is configured and print setup guidance
    Setup {
        /// Also call the GitHub API to confirm the token works
        #[arg(long)]
        verify: bool,
    },
    /// Dispatch the deployment workflow for one environment
    Trigger {
        #[arg(short, long)]
        environment: Environment,
        /// Test suites to run (defaults per environment)
        #[arg(long)]
        test_type: Option<String>,
        /// Dispatch with run_tests=false
        #[arg(long)]
        no_tests: bool,
        /// Dispatch with deploy_latest=false
        #[arg(long)]
        no_deploy_latest: bool,
        /// Poll the run until it completes
        #[arg(long)]
        monitor: bool,
    },
    /// Poll an existing workflow run until it completes
    Monitor {
        run_id: u64,
    },
    /// Deploy a run of environments in sequence (dev, qa and stage by default)
    Deploy {
        /// First environment to deploy
        #[arg(long, default_value = "dev")]
        start_from: Environment,
        /// Last environment to deploy
        #[arg(long, default_value = "stage")]
        target: Environment,
        /// Poll each run and stop on the first failure
        #[arg(long)]
        monitor: bool,
    },
    /// Deploy dev, qa and stage with retries, issues and hotfix branches
    Agent,
    /// Apply branch protection to dev, qa, stage and prod
    ProtectBranches,
    /// Show the head commit of each environment branch
    Status,
}

fn main() -> anyhow::Result<ExitCode> {
    dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    Ok(runtime.block_on(run(cli)))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn load_config(repository: Option<String>) -> Result<Arc<Config>> {
    let mut config = Config::load().await?;
    if let Some(repository) = repository {
        config.github_repository = repository;
        config.validate()?;
    }
    Ok(Arc::new(config))
}

fn github_service(config: &Config) -> Result<Arc<dyn GitHubService>> {
    let client = GitHubClient::from_config(build_http_client()?, config)?;
    Ok(Arc::new(client))
}

async fn run(cli: Cli) -> ExitCode {
    let config = match load_config(cli.repository).await {
        Ok(config) => config,
        Err(e) => {
            report_error(&e, &Config::default());
            return ExitCode::from(e.exit_code());
        }
    };

    match execute(cli.command, config.clone()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            report_error(&e, &config);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Returns whether the command succeeded.
async fn execute(command: Command, config: Arc<Config>) -> Result<bool> {
    match command {
        Command::Setup { verify } => {
            let report = check_setup(&config);
            println!("📦 Repository: {}", report.repository);
            println!("🔄 Workflow: {}", report.workflow_file);
            for line in &report.guidance {
                println!("{}", line);
            }
            if !report.is_ready() {
                return Ok(false);
            }
            if verify {
                let user = github_service(&config)?.get_authenticated_user().await?;
                println!("✅ Authenticated as {}", user.login);
            }
            Ok(true)
        }

        Command::Trigger {
            environment,
            test_type,
            no_tests,
            no_deploy_latest,
            monitor,
        } => {
            let github = github_service(&config)?;
            let options = TriggerOptions {
                test_type,
                run_tests: !no_tests,
                deploy_latest: !no_deploy_latest,
            };
            let outcome = WorkflowTrigger::new(github.clone(), config.clone())
                .trigger(environment, &options)
                .await?;

            println!(
                "✅ Triggered {} deployment (tests: {})",
                environment, outcome.test_type
            );
            println!("🔗 Monitor at: {}", outcome.monitor_url);

            match (monitor, outcome.run_id) {
                (true, Some(run_id)) => {
                    let result = RunMonitor::new(github, config.poll_policy())
                        .wait_for_completion(run_id)
                        .await?;
                    println!(
                        "🏁 Run {} finished: {}",
                        run_id,
                        result.run.conclusion.as_deref().unwrap_or("none")
                    );
                    Ok(result.succeeded)
                }
                (true, None) => {
                    println!("⚠️ No run id available to monitor");
                    Ok(false)
                }
                (false, _) => Ok(true),
            }
        }

        Command::Monitor { run_id } => {
            let github = github_service(&config)?;
            let result = RunMonitor::new(github, config.poll_policy())
                .wait_for_completion(run_id)
                .await?;
            println!(
                "🏁 Run {} finished: {}",
                run_id,
                result.run.conclusion.as_deref().unwrap_or("none")
            );
            Ok(result.succeeded)
        }

        Command::Deploy {
            start_from,
            target,
            monitor,
        } => {
            let environments = Environment::pipeline(start_from, target)?;
            let github = github_service(&config)?;
            let summary = DeploymentSequence::new(github, config.clone())
                .run(&environments, monitor, &TriggerOptions::default())
                .await?;

            for stage in &summary.stages {
                let mark = if stage.succeeded { "✅" } else { "❌" };
                println!(
                    "{} {:>5}: {}",
                    mark,
                    stage.environment.as_str(),
                    stage.dispatch.monitor_url
                );
            }
            Ok(summary.succeeded())
        }

        Command::Agent => {
            let github = github_service(&config)?;
            let summary = DeploymentAgent::new(github, config.clone()).run().await?;
            Ok(summary.succeeded())
        }

        Command::ProtectBranches => {
            let github = github_service(&config)?;
            let protected = BranchProtector::new(github).protect_all().await?;
            info!("🔒 Protected branches: {}", protected.join(", "));
            Ok(true)
        }

        Command::Status => {
            let github = github_service(&config)?;
            let statuses = EnvironmentStatusService::new(github).collect().await?;
            for status in statuses {
                println!("{}", status);
            }
            Ok(true)
        }
    }
}

fn report_error(err: &AppError, config: &Config) {
    match err {
        AppError::MissingToken => {
            for line in check_setup(config).guidance {
                eprintln!("{}", line);
            }
        }
        AppError::UnexpectedStatus { actual, body, .. } => {
            eprintln!("❌ Failed to trigger workflow. HTTP {}", *actual);
            eprintln!("Response: {}", body);
        }
        other => {
            eprintln!("❌ {}", other);
        }
    }
    error!(error = %err, "💥 Command failed");
}
