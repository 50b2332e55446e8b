//! Environment checks: init, validate, then marker assertions.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use tfcheck_terraform::output::{contains_marker, INIT_SUCCESS_MARKER, VALIDATE_SUCCESS_MARKER};
use tfcheck_terraform::{TerraformCommands, TerraformError};

use crate::config::SuiteConfig;
use crate::environment::Environment;
use crate::error::{EnvError, EnvResult};
use crate::report::{EnvironmentOutcome, EnvironmentReport, SuiteReport};

/// Runs environment checks against a [`TerraformCommands`] implementation.
#[derive(Clone)]
pub struct EnvironmentValidator {
    terraform: Arc<dyn TerraformCommands>,
    config: Arc<SuiteConfig>,
}

impl EnvironmentValidator {
    pub fn new(terraform: Arc<dyn TerraformCommands>, config: SuiteConfig) -> Self {
        Self {
            terraform,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Check one environment.
    ///
    /// `init` always runs first and `validate` only runs if `init` succeeded.
    /// A failed invocation ends the check with an error; missing markers
    /// only fail the returned report.
    pub async fn check(&self, environment: Environment) -> EnvResult<EnvironmentReport> {
        let options = self.config.options_for(environment);
        let settings = self.config.settings(environment);
        let directory = options.terraform_dir.clone();
        let started = Instant::now();

        info!("Checking {} environment in {:?}", environment, directory);

        let invocation = |source: TerraformError| {
            error!("{}: {}", environment, source);
            EnvError::Invocation {
                environment,
                directory: directory.clone(),
                source,
            }
        };

        let init_output = self.terraform.init(&options).await.map_err(invocation)?;
        let validate_output = self.terraform.validate(&options).await.map_err(invocation)?;

        let mut report = EnvironmentReport::new(environment, directory.clone());
        report.add_check("init", true, "terraform init exited successfully");
        report.add_check("validate", true, "terraform validate exited successfully");

        if settings.assert_markers {
            assert_marker(&mut report, "init-output", &init_output, INIT_SUCCESS_MARKER);
            assert_marker(&mut report, "validate-output", &validate_output, VALIDATE_SUCCESS_MARKER);
        }

        report.init_output = init_output;
        report.validate_output = validate_output;
        report.duration_ms = started.elapsed().as_millis() as u64;

        if report.passed {
            info!("{} passed in {}ms", environment, report.duration_ms);
        }
        Ok(report)
    }

    /// Check environments concurrently, one task each.
    pub async fn check_all(&self, environments: &[Environment]) -> SuiteReport {
        let mut tasks = JoinSet::new();
        for &environment in environments {
            let validator = self.clone();
            tasks.spawn(async move { (environment, validator.check(environment).await) });
        }

        let mut outcomes = Vec::with_capacity(environments.len());
        let mut pending: Vec<Environment> = environments.to_vec();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((environment, result)) => {
                    pending.retain(|e| *e != environment);
                    outcomes.push(EnvironmentOutcome::from_result(environment, result));
                }
                Err(e) => error!("Environment check task failed: {}", e),
            }
        }

        // A task that panicked never reported its environment.
        for environment in pending {
            outcomes.push(EnvironmentOutcome::from_result(
                environment,
                Err(EnvError::Task {
                    environment,
                    message: "check task panicked or was cancelled".to_string(),
                }),
            ));
        }

        SuiteReport::new(outcomes)
    }

    /// Check environments one after another.
    pub async fn check_sequential(&self, environments: &[Environment]) -> SuiteReport {
        let mut outcomes = Vec::with_capacity(environments.len());
        for &environment in environments {
            let result = self.check(environment).await;
            outcomes.push(EnvironmentOutcome::from_result(environment, result));
        }
        SuiteReport::new(outcomes)
    }
}

fn assert_marker(report: &mut EnvironmentReport, name: &str, output: &str, marker: &str) {
    if contains_marker(output, marker) {
        report.add_check(name, true, format!("found {:?}", marker));
    } else {
        warn!(
            "{}: {} does not contain {:?}",
            report.environment, name, marker
        );
        report.add_check(name, false, format!("output does not contain {:?}", marker));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfcheck_runner::{MockResponse, MockRunner};
    use tfcheck_terraform::Terraform;

    const INIT_OK: &str = "Initializing the backend...\n\nTerraform has been successfully initialized!\n";
    const VALIDATE_OK: &str = "Success! The configuration is valid.\n";

    fn validator(mock: &MockRunner, config: SuiteConfig) -> EnvironmentValidator {
        EnvironmentValidator::new(Arc::new(Terraform::new(Arc::new(mock.clone()))), config)
    }

    #[tokio::test]
    async fn test_check_passes_with_markers() {
        let mock = MockRunner::new()
            .on("init", MockResponse::success(INIT_OK))
            .on("validate", MockResponse::success(VALIDATE_OK));

        let report = validator(&mock, SuiteConfig::default())
            .check(Environment::Dev)
            .await
            .unwrap();

        assert!(report.passed);
        assert_eq!(report.checks.len(), 4);
        assert_eq!(report.directory, std::path::PathBuf::from("terraform/environments/dev"));

        let order: Vec<String> = mock
            .get_calls()
            .iter()
            .filter_map(|c| c.subcommand().map(str::to_string))
            .collect();
        assert_eq!(order, vec!["init", "validate"]);
    }

    #[tokio::test]
    async fn test_missing_marker_fails_report_not_check() {
        let mock = MockRunner::new()
            .on("init", MockResponse::success("Terraform initialized in an empty directory!"))
            .on("validate", MockResponse::success(VALIDATE_OK));

        let report = validator(&mock, SuiteConfig::default())
            .check(Environment::Prod)
            .await
            .unwrap();

        assert!(!report.passed);
        let failed: Vec<&str> = report.failed_checks().map(|c| c.name.as_str()).collect();
        assert_eq!(failed, vec!["init-output"]);
    }

    #[tokio::test]
    async fn test_markers_skipped_when_disabled() {
        let mock = MockRunner::new()
            .on("init", MockResponse::success("done"))
            .on("validate", MockResponse::success("done"));

        let report = validator(&mock, SuiteConfig::default().without_marker_assertions())
            .check(Environment::Staging)
            .await
            .unwrap();

        assert!(report.passed);
        assert_eq!(report.checks.len(), 2);
    }

    #[tokio::test]
    async fn test_init_failure_skips_validate() {
        let mock = MockRunner::new().on("init", MockResponse::failure(1, "Error: Failed to query provider"));

        let err = validator(&mock, SuiteConfig::default())
            .check(Environment::Dev)
            .await
            .unwrap_err();

        assert!(err.is_invocation());
        assert!(!mock.was_called("validate"));
    }
}
