//! Command runner trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{CommandConfig, RunConfig};
use crate::error::RunnerResult;

/// Result of a command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code from the process (-1 when killed by a signal)
    pub exit_code: i64,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executes external commands.
///
/// Calls block the caller until the process has exited and its output has
/// been fully captured.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Check whether `program` can be executed by this runner.
    async fn is_available(&self, program: &str) -> RunnerResult<bool>;

    /// Run a command to completion.
    ///
    /// A non-zero exit code is not an error at this level; callers decide
    /// what a failed exit means.
    async fn run(&self, command: &CommandConfig, run_config: &RunConfig)
        -> RunnerResult<ExecutionResult>;
}
