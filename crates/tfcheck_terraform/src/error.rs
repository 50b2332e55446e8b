//! Error types for Terraform invocations.

use thiserror::Error;

use crate::terraform::TerraformCommand;

/// Result type alias for Terraform operations.
pub type TerraformResult<T> = Result<T, TerraformError>;

/// Errors that can occur while invoking Terraform.
#[derive(Error, Debug)]
pub enum TerraformError {
    #[error("terraform {command} failed with exit code {exit_code}:\n{output}")]
    CommandFailed {
        command: TerraformCommand,
        exit_code: i64,
        output: String,
    },

    #[error("Terraform not available: {0}")]
    NotAvailable(String),

    #[error("Runner error: {0}")]
    Runner(#[from] tfcheck_runner::RunnerError),
}

impl TerraformError {
    /// Captured tool output, when the tool got far enough to produce any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}
