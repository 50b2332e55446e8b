//! Error types for environment checks.

use std::path::PathBuf;

use thiserror::Error;

use crate::environment::Environment;

/// Result type alias for environment operations.
pub type EnvResult<T> = Result<T, EnvError>;

/// Errors that can occur while checking environments.
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("{environment}: terraform invocation failed in {}: {source}", .directory.display())]
    Invocation {
        environment: Environment,
        directory: PathBuf,
        #[source]
        source: tfcheck_terraform::TerraformError,
    },

    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Check task failed for {environment}: {message}")]
    Task {
        environment: Environment,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl EnvError {
    /// Whether this is a failure to run terraform, as opposed to a setup problem.
    pub fn is_invocation(&self) -> bool {
        matches!(self, Self::Invocation { .. })
    }
}
