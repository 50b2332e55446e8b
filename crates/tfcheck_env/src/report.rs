//! Check results.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::environment::Environment;
use crate::error::{EnvError, EnvResult};

/// One pass/fail item in an environment report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
}

/// Outcome of a check whose terraform invocations both succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub environment: Environment,
    pub directory: PathBuf,
    pub checks: Vec<ValidationCheck>,
    pub passed: bool,
    pub init_output: String,
    pub validate_output: String,
    pub checked_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl EnvironmentReport {
    pub fn new(environment: Environment, directory: PathBuf) -> Self {
        Self {
            environment,
            directory,
            checks: Vec::new(),
            passed: true,
            init_output: String::new(),
            validate_output: String::new(),
            checked_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn add_check(&mut self, name: &str, passed: bool, message: impl Into<String>) {
        if !passed {
            self.passed = false;
        }
        self.checks.push(ValidationCheck {
            name: name.to_string(),
            passed,
            message: message.into(),
        });
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &ValidationCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// What happened to one environment.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnvironmentOutcome {
    /// Both commands ran; `passed` tells whether the assertions held.
    Completed(EnvironmentReport),
    /// A command failed to run or exited non-zero.
    InvocationFailed {
        environment: Environment,
        directory: Option<PathBuf>,
        error: String,
        output: Option<String>,
    },
}

impl EnvironmentOutcome {
    pub fn from_result(environment: Environment, result: EnvResult<EnvironmentReport>) -> Self {
        match result {
            Ok(report) => Self::Completed(report),
            Err(EnvError::Invocation {
                environment,
                directory,
                source,
            }) => Self::InvocationFailed {
                environment,
                directory: Some(directory),
                error: source.to_string(),
                output: source.output().map(str::to_string),
            },
            Err(other) => Self::InvocationFailed {
                environment,
                directory: None,
                error: other.to_string(),
                output: None,
            },
        }
    }

    pub fn environment(&self) -> Environment {
        match self {
            Self::Completed(report) => report.environment,
            Self::InvocationFailed { environment, .. } => *environment,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Self::Completed(report) if report.passed)
    }

    pub fn is_invocation_failure(&self) -> bool {
        matches!(self, Self::InvocationFailed { .. })
    }
}

/// Outcomes of a suite run, in environment order.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub outcomes: Vec<EnvironmentOutcome>,
}

impl SuiteReport {
    pub fn new(mut outcomes: Vec<EnvironmentOutcome>) -> Self {
        outcomes.sort_by_key(EnvironmentOutcome::environment);
        Self { outcomes }
    }

    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(EnvironmentOutcome::passed)
    }

    pub fn invocation_failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.is_invocation_failure())
            .count()
    }

    /// Completed checks whose assertions did not hold.
    pub fn assertion_failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EnvironmentOutcome::Completed(r) if !r.passed))
            .count()
    }

    /// Pass/fail per environment.
    pub fn verdicts(&self) -> Vec<(Environment, bool)> {
        self.outcomes
            .iter()
            .map(|o| (o.environment(), o.passed()))
            .collect()
    }

    pub fn outcome(&self, environment: Environment) -> Option<&EnvironmentOutcome> {
        self.outcomes.iter().find(|o| o.environment() == environment)
    }
}
