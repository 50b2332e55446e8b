//! Error types for the runner module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur during runner operations.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Program not found: {0}")]
    ProgramNotFound(String),

    #[error("Working directory not found: {}", .0.display())]
    WorkingDirNotFound(PathBuf),

    #[error("Failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Command timeout after {0} seconds")]
    Timeout(u64),

    #[error("Container runtime not available: {0}")]
    RuntimeNotAvailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
