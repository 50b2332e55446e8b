//! Check command - Initialize and validate environments.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::{debug, info};

use tfcheck_env::{
    Environment, EnvironmentOutcome, EnvironmentValidator, ExecutionMode, SuiteConfig, SuiteReport,
};
use tfcheck_runner::{
    CommandRunner, ContainerCommandRunner, ContainerRuntime, ProcessRunner, ProcessRunnerOptions,
};
use tfcheck_terraform::Terraform;

use super::{load_config, parse_environment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Environments to check (default: all)
    #[arg(value_parser = parse_environment)]
    pub environments: Vec<Environment>,

    /// Suite configuration file
    #[arg(short, long, env = "TFCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding one sub-directory per environment
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Check environments one after another
    #[arg(long)]
    pub sequential: bool,

    /// Let terraform emit colored output
    #[arg(long)]
    pub color: bool,

    /// Only require that init and validate exit successfully
    #[arg(long)]
    pub no_assert: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Run terraform in a container (docker or podman)
    #[arg(long)]
    pub container: bool,

    /// Print the terraform commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Echo terraform's output while it runs (text format only)
    #[arg(long)]
    pub stream: bool,
}

/// A suite run that finished with failing environments.
#[derive(Debug)]
pub struct SuiteFailure {
    pub invocation_failures: usize,
    pub assertion_failures: usize,
}

impl fmt::Display for SuiteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} environment(s) failed to run terraform, {} failed assertions",
            self.invocation_failures, self.assertion_failures
        )
    }
}

impl std::error::Error for SuiteFailure {}

pub async fn execute(args: CheckArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref(), args.root.clone())?;
    if args.color {
        config = config.with_no_color(false);
    }
    if args.no_assert || args.dry_run {
        // Dry-run output never carries terraform's success messages.
        config = config.without_marker_assertions();
    }
    if args.container {
        config.execution.mode = ExecutionMode::Container;
    }

    let environments = if args.environments.is_empty() {
        Environment::all().to_vec()
    } else {
        dedup(args.environments)
    };

    let runner = build_runner(&config, args.dry_run)?;
    let terraform = Terraform::new(runner).with_stream_logs(args.stream && args.format == OutputFormat::Text);
    let validator = EnvironmentValidator::new(Arc::new(terraform), config);

    info!(
        "Checking {} environment(s){}",
        environments.len(),
        if args.sequential { " sequentially" } else { "" }
    );

    let suite = if args.sequential {
        validator.check_sequential(&environments).await
    } else {
        validator.check_all(&environments).await
    };

    match args.format {
        OutputFormat::Text => print_text(&suite),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&suite).context("Failed to serialize report")?
        ),
    }

    if suite.passed() {
        Ok(())
    } else {
        Err(SuiteFailure {
            invocation_failures: suite.invocation_failures(),
            assertion_failures: suite.assertion_failures(),
        }
        .into())
    }
}

fn build_runner(config: &SuiteConfig, dry_run: bool) -> Result<Arc<dyn CommandRunner>> {
    let mut options = ProcessRunnerOptions::new();
    if dry_run {
        options = options.dry_run();
    }

    match config.execution.mode {
        ExecutionMode::Host => {
            debug!("Running {} on the host", config.terraform_binary);
            Ok(Arc::new(ProcessRunner::new(options)))
        }
        ExecutionMode::Container => {
            let image = config.execution.container_image();
            let runtime = if dry_run {
                config.execution.runtime.unwrap_or(ContainerRuntime::Docker)
            } else {
                ContainerRuntime::detect(config.execution.runtime)
                    .context("Container mode needs docker or podman")?
            };
            info!("Running {} with {}", image.full_image(), runtime);
            Ok(Arc::new(ContainerCommandRunner::with_runtime(runtime, image, options)))
        }
    }
}

fn dedup(environments: Vec<Environment>) -> Vec<Environment> {
    let mut seen = Vec::with_capacity(environments.len());
    for environment in environments {
        if !seen.contains(&environment) {
            seen.push(environment);
        }
    }
    seen
}

fn print_text(suite: &SuiteReport) {
    println!("🔍 Terraform environment checks");
    println!();

    for outcome in &suite.outcomes {
        match outcome {
            EnvironmentOutcome::Completed(report) => {
                let icon = if report.passed { "✅" } else { "❌" };
                println!(
                    "{} {} ({}) - {}ms",
                    icon,
                    report.environment.display_name(),
                    report.directory.display(),
                    report.duration_ms
                );
                for check in &report.checks {
                    let icon = if check.passed { "✓" } else { "✗" };
                    println!("   {} {}: {}", icon, check.name, check.message);
                }
            }
            EnvironmentOutcome::InvocationFailed {
                environment,
                error,
                ..
            } => {
                println!("❌ {}", environment.display_name());
                for line in error.lines() {
                    println!("   {}", line);
                }
            }
        }
    }

    println!();
    if suite.passed() {
        println!("✅ All environments passed!");
    } else {
        println!(
            "❌ {} of {} environment(s) failed",
            suite.outcomes.iter().filter(|o| !o.passed()).count(),
            suite.outcomes.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfcheck_terraform::TerraformCommands;

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let environments = dedup(vec![
            Environment::Prod,
            Environment::Dev,
            Environment::Prod,
        ]);
        assert_eq!(environments, vec![Environment::Prod, Environment::Dev]);
    }

    #[test]
    fn test_dry_run_container_runner_skips_detection() {
        let mut config = SuiteConfig::default();
        config.execution.mode = ExecutionMode::Container;
        config.execution.runtime = Some(ContainerRuntime::Podman);

        assert!(build_runner(&config, true).is_ok());
    }

    #[tokio::test]
    async fn test_container_mode_passes_vars_to_an_init_that_accepts_them() {
        let dir = tempfile::tempdir().unwrap();
        let config = SuiteConfig::from_yaml(
            "execution:\n  mode: container\n  runtime: docker\nenvironments:\n  dev:\n    vars:\n      region: eu-west-1\n",
        )
        .unwrap()
        .with_root(dir.path());
        std::fs::create_dir(dir.path().join("dev")).unwrap();

        let runner = build_runner(&config, true).unwrap();
        let output = Terraform::new(runner)
            .init(&config.options_for(Environment::Dev))
            .await
            .unwrap();

        assert!(output.contains("hashicorp/terraform:1.9 init"), "{}", output);
        assert!(output.contains("-var region=eu-west-1"), "{}", output);
    }

    #[test]
    fn test_suite_failure_message() {
        let failure = SuiteFailure {
            invocation_failures: 1,
            assertion_failures: 0,
        };
        assert!(failure.to_string().starts_with("1 environment(s)"));
    }
}
