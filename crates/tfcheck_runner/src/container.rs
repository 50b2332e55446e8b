//! Container-backed runner using the Docker or Podman CLI.
//!
//! The command's working directory is bind-mounted at `/workspace` and the
//! image's entrypoint stands in for the program, so only the arguments are
//! forwarded. Paths inside the arguments must therefore be relative to the
//! working directory.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{CommandConfig, ContainerImage, RunConfig};
use crate::error::{RunnerError, RunnerResult};
use crate::process::{ProcessRunner, ProcessRunnerOptions};
use crate::runner::{CommandRunner, ExecutionResult};

const CONTAINER_WORKDIR: &str = "/workspace";

/// Container runtime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    Docker,
    Podman,
}

impl ContainerRuntime {
    /// Get the CLI command name.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Podman => "podman",
        }
    }

    /// Detect an available runtime, trying the preferred one first.
    pub fn detect(preferred: Option<ContainerRuntime>) -> RunnerResult<Self> {
        if let Some(preferred) = preferred {
            if ProcessRunner::is_program_available(preferred.command()) {
                return Ok(preferred);
            }
            warn!(
                "Preferred runtime {} not available, trying alternatives",
                preferred
            );
        }

        [Self::Docker, Self::Podman]
            .into_iter()
            .find(|runtime| ProcessRunner::is_program_available(runtime.command()))
            .ok_or_else(|| {
                RunnerError::RuntimeNotAvailable(
                    "Neither Docker nor Podman is available".to_string(),
                )
            })
    }
}

impl std::fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// Runs each command inside a throwaway container.
pub struct ContainerCommandRunner {
    runtime: ContainerRuntime,
    image: ContainerImage,
    host: Arc<dyn CommandRunner>,
}

impl ContainerCommandRunner {
    /// Create a runner with automatic runtime detection.
    pub fn new(image: ContainerImage, options: ProcessRunnerOptions) -> RunnerResult<Self> {
        let runtime = ContainerRuntime::detect(None)?;
        info!("Using container runtime: {}", runtime);
        Ok(Self::with_runtime(runtime, image, options))
    }

    /// Create a runner with a specific runtime.
    pub fn with_runtime(
        runtime: ContainerRuntime,
        image: ContainerImage,
        options: ProcessRunnerOptions,
    ) -> Self {
        Self::with_host(runtime, image, Arc::new(ProcessRunner::new(options)))
    }

    /// Create a runner that issues runtime CLI calls through `host`.
    pub fn with_host(
        runtime: ContainerRuntime,
        image: ContainerImage,
        host: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            runtime,
            image,
            host,
        }
    }

    /// Get the current runtime.
    pub fn runtime(&self) -> ContainerRuntime {
        self.runtime
    }

    /// Translate a command into the runtime's `run` invocation for container `name`.
    pub fn container_command(&self, command: &CommandConfig, name: &str) -> CommandConfig {
        let mut args = vec!["run".to_string(), "--rm".to_string()];

        args.push("--name".to_string());
        args.push(name.to_string());

        for (key, value) in &command.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }

        if let Some(dir) = &command.working_dir {
            args.push("-v".to_string());
            args.push(format!("{}:{}", mount_source(dir), CONTAINER_WORKDIR));
            args.push("-w".to_string());
            args.push(CONTAINER_WORKDIR.to_string());
        }

        args.push(self.image.full_image());
        args.extend(command.args.iter().cloned());

        CommandConfig::new(self.runtime.command()).args(args)
    }

    /// Force-remove a container whose client was killed.
    async fn remove_container(&self, name: &str) {
        let command = CommandConfig::new(self.runtime.command()).args(["rm", "-f", name]);
        match self.host.run(&command, &RunConfig::default().timeout(60)).await {
            Ok(result) if result.success() => info!("Removed timed out container {}", name),
            Ok(result) => warn!(
                "Failed to remove container {}: {}",
                name,
                result.combined_output()
            ),
            Err(e) => warn!("Failed to remove container {}: {}", name, e),
        }
    }
}

fn container_name() -> String {
    format!("tfcheck-{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
}

fn mount_source(dir: &Path) -> String {
    dir.canonicalize()
        .unwrap_or_else(|_| dir.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

#[async_trait]
impl CommandRunner for ContainerCommandRunner {
    async fn is_available(&self, _program: &str) -> RunnerResult<bool> {
        self.host.is_available(self.runtime.command()).await
    }

    async fn run(
        &self,
        command: &CommandConfig,
        run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        if let Some(dir) = &command.working_dir {
            if !dir.is_dir() {
                return Err(RunnerError::WorkingDirNotFound(dir.clone()));
            }
        }

        let name = container_name();
        info!(
            "Running {} in container {} ({})",
            command.program,
            name,
            self.image.full_image()
        );

        match self.host.run(&self.container_command(command, &name), run_config).await {
            // Killing the runtime client leaves the container itself running.
            Err(RunnerError::Timeout(seconds)) => {
                self.remove_container(&name).await;
                Err(RunnerError::Timeout(seconds))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockResponse, MockRunner};
    use tempfile::tempdir;

    #[test]
    fn test_container_command_args() {
        let dir = tempdir().unwrap();
        let runner = ContainerCommandRunner::with_runtime(
            ContainerRuntime::Docker,
            ContainerImage::terraform(),
            ProcessRunnerOptions::new(),
        );

        let command = CommandConfig::new("terraform")
            .args(["validate", "-no-color"])
            .working_dir(dir.path())
            .env("TF_IN_AUTOMATION", "1");
        let wrapped = runner.container_command(&command, "tfcheck-test");

        assert_eq!(wrapped.program, "docker");
        assert_eq!(wrapped.subcommand(), Some("run"));
        assert!(wrapped.args.contains(&"--rm".to_string()));
        assert!(wrapped.args.contains(&"tfcheck-test".to_string()));
        assert!(wrapped.args.contains(&"TF_IN_AUTOMATION=1".to_string()));
        assert!(wrapped.args.contains(&"/workspace".to_string()));

        let image_pos = wrapped
            .args
            .iter()
            .position(|a| a == "hashicorp/terraform:1.9")
            .unwrap();
        assert_eq!(&wrapped.args[image_pos + 1..], ["validate", "-no-color"]);
    }

    #[test]
    fn test_runtime_display() {
        assert_eq!(ContainerRuntime::Podman.to_string(), "podman");
    }

    #[tokio::test]
    async fn test_dry_run_through_container() {
        let dir = tempdir().unwrap();
        let runner = ContainerCommandRunner::with_runtime(
            ContainerRuntime::Podman,
            ContainerImage::new("hashicorp/terraform", "1.9"),
            ProcessRunnerOptions::new().dry_run(),
        );

        let command = CommandConfig::new("terraform").arg("init").working_dir(dir.path());
        let result = runner.run(&command, &RunConfig::default()).await.unwrap();

        assert!(result.stdout.contains("podman run --rm"));
        assert!(result.stdout.contains("hashicorp/terraform:1.9 init"));
    }

    #[tokio::test]
    async fn test_timeout_removes_container() {
        let dir = tempdir().unwrap();
        let host = MockRunner::new()
            .on("run", MockResponse::timed_out(5))
            .on("rm", MockResponse::success("tfcheck-removed"));
        let runner = ContainerCommandRunner::with_host(
            ContainerRuntime::Docker,
            ContainerImage::terraform(),
            Arc::new(host.clone()),
        );

        let command = CommandConfig::new("terraform").arg("init").working_dir(dir.path());
        let err = runner.run(&command, &RunConfig::default().timeout(5)).await.unwrap_err();
        assert!(matches!(err, RunnerError::Timeout(5)));

        let run_call = &host.get_subcommand_calls("run")[0];
        let name_pos = run_call.args.iter().position(|a| a == "--name").unwrap();
        let name = &run_call.args[name_pos + 1];

        let rm_calls = host.get_subcommand_calls("rm");
        assert_eq!(rm_calls.len(), 1);
        assert_eq!(rm_calls[0].program, "docker");
        assert_eq!(rm_calls[0].args, vec!["rm".to_string(), "-f".to_string(), name.clone()]);
    }

    #[tokio::test]
    async fn test_failed_run_does_not_remove_container() {
        let dir = tempdir().unwrap();
        let host = MockRunner::new().on("run", MockResponse::failure(1, "Error: bad config"));
        let runner = ContainerCommandRunner::with_host(
            ContainerRuntime::Podman,
            ContainerImage::terraform(),
            Arc::new(host.clone()),
        );

        let command = CommandConfig::new("terraform").arg("validate").working_dir(dir.path());
        let result = runner.run(&command, &RunConfig::default()).await.unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(!host.was_called("rm"));
    }
}
