//! Terraform command execution.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tfcheck_runner::{CommandConfig, CommandRunner, RunConfig};

use crate::args;
use crate::error::{TerraformError, TerraformResult};
use crate::options::TerraformOptions;

/// Terraform sub-commands tfcheck runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerraformCommand {
    Init,
    Validate,
    Version,
}

impl TerraformCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Validate => "validate",
            Self::Version => "version",
        }
    }
}

impl std::fmt::Display for TerraformCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two operations an environment check needs from Terraform.
///
/// Both return the tool's combined output. A non-zero exit, or a failure to
/// run the tool at all, is an error.
#[async_trait]
pub trait TerraformCommands: Send + Sync {
    /// Prepare the directory (backend, modules, providers).
    async fn init(&self, options: &TerraformOptions) -> TerraformResult<String>;

    /// Check the configuration's syntax and structure.
    async fn validate(&self, options: &TerraformOptions) -> TerraformResult<String>;
}

/// Runs the terraform binary through a [`CommandRunner`].
#[derive(Clone)]
pub struct Terraform {
    runner: Arc<dyn CommandRunner>,
    stream_logs: bool,
}

impl Terraform {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            stream_logs: false,
        }
    }

    /// Echo terraform's output while it runs.
    pub fn with_stream_logs(mut self, enabled: bool) -> Self {
        self.stream_logs = enabled;
        self
    }

    /// Run `terraform version`, failing with `NotAvailable` if it can't run.
    pub async fn version(&self, options: &TerraformOptions) -> TerraformResult<String> {
        let command = CommandConfig::new(&options.binary).arg("version");
        let run_config = RunConfig::default().timeout(60);

        let result = self
            .runner
            .run(&command, &run_config)
            .await
            .map_err(|e| TerraformError::NotAvailable(e.to_string()))?;

        if !result.success() {
            return Err(TerraformError::NotAvailable(result.combined_output()));
        }
        Ok(result.stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    /// Check whether the configured binary can be executed.
    pub async fn is_available(&self, options: &TerraformOptions) -> bool {
        self.runner
            .is_available(&options.binary)
            .await
            .unwrap_or(false)
    }

    async fn run_command(
        &self,
        options: &TerraformOptions,
        command: TerraformCommand,
        args: Vec<String>,
    ) -> TerraformResult<String> {
        let mut config = CommandConfig::new(&options.binary)
            .args(args)
            .working_dir(&options.terraform_dir);
        for (key, value) in &options.env_vars {
            config = config.env(key, value);
        }

        let run_config = RunConfig::default()
            .timeout(options.timeout_seconds)
            .stream_logs(self.stream_logs);

        debug!("Executing {}", config.display());

        let result = self.runner.run(&config, &run_config).await?;
        let output = result.combined_output();

        if !result.success() {
            return Err(TerraformError::CommandFailed {
                command,
                exit_code: result.exit_code,
                output,
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl TerraformCommands for Terraform {
    async fn init(&self, options: &TerraformOptions) -> TerraformResult<String> {
        info!("Running terraform init in {:?}", options.terraform_dir);
        self.run_command(options, TerraformCommand::Init, args::init_args(options))
            .await
    }

    async fn validate(&self, options: &TerraformOptions) -> TerraformResult<String> {
        info!("Running terraform validate in {:?}", options.terraform_dir);
        self.run_command(options, TerraformCommand::Validate, args::validate_args(options))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tfcheck_runner::{MockResponse, MockRunner, RunnerError};

    fn terraform(mock: &MockRunner) -> Terraform {
        Terraform::new(Arc::new(mock.clone()))
    }

    #[tokio::test]
    async fn test_init_runs_in_terraform_dir() {
        let mock = MockRunner::new().on(
            "init",
            MockResponse::success("Terraform has been successfully initialized!"),
        );
        let options = TerraformOptions::new("/repo/envs/dev")
            .no_color(true)
            .env_var("TF_PLUGIN_CACHE_DIR", "/tmp/cache");

        let output = terraform(&mock).init(&options).await.unwrap();
        assert!(output.contains("successfully initialized"));

        let calls = mock.get_subcommand_calls("init");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "terraform");
        assert_eq!(calls[0].working_dir, Some(PathBuf::from("/repo/envs/dev")));
        assert!(calls[0].args.contains(&"-no-color".to_string()));
        assert_eq!(
            calls[0].env.get("TF_PLUGIN_CACHE_DIR"),
            Some(&"/tmp/cache".to_string())
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_command_failed() {
        let mock = MockRunner::new().on(
            "validate",
            MockResponse::failure(1, "Error: Missing required argument"),
        );
        let options = TerraformOptions::new("/repo/envs/staging");

        let err = terraform(&mock).validate(&options).await.unwrap_err();
        match &err {
            TerraformError::CommandFailed {
                command,
                exit_code,
                output,
            } => {
                assert_eq!(*command, TerraformCommand::Validate);
                assert_eq!(*exit_code, 1);
                assert!(output.contains("Missing required argument"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.output().is_some());
    }

    #[tokio::test]
    async fn test_runner_error_propagates() {
        let mock = MockRunner::new().simulate_failure("no such file");
        let options = TerraformOptions::new("/repo/envs/prod");

        let err = terraform(&mock).init(&options).await.unwrap_err();
        assert!(matches!(
            err,
            TerraformError::Runner(RunnerError::ExecutionFailed(_))
        ));
        assert!(err.output().is_none());
    }

    #[tokio::test]
    async fn test_version_first_line() {
        let mock = MockRunner::new().on(
            "version",
            MockResponse::success("Terraform v1.6.6\non linux_amd64\n"),
        );
        let options = TerraformOptions::new(".").binary("tf");

        let version = terraform(&mock).version(&options).await.unwrap();
        assert_eq!(version, "Terraform v1.6.6");
        assert_eq!(mock.get_calls()[0].program, "tf");
        assert!(terraform(&mock).is_available(&options).await);
    }

    #[tokio::test]
    async fn test_version_unavailable() {
        let mock = MockRunner::new().simulate_failure("not found");
        let err = terraform(&mock)
            .version(&TerraformOptions::new("."))
            .await
            .unwrap_err();

        assert!(matches!(err, TerraformError::NotAvailable(_)));
    }

    #[test]
    fn test_command_display() {
        assert_eq!(TerraformCommand::Init.to_string(), "init");
        assert_eq!(TerraformCommand::Validate.to_string(), "validate");
    }
}
