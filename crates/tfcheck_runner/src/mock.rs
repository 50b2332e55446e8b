//! Mock command runner for testing.
//!
//! Provides a scripted implementation of the CommandRunner trait for use in
//! tests that must not spawn real processes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::config::{CommandConfig, RunConfig};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandRunner, ExecutionResult};

/// Predefined mock response for a command execution.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    /// Fail with `RunnerError::Timeout` instead of returning output
    pub timed_out: Option<u64>,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 100,
            timed_out: None,
        }
    }

    pub fn failure(exit_code: i64, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 100,
            timed_out: None,
        }
    }

    /// A run that exceeded its `seconds` budget.
    pub fn timed_out(seconds: u64) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
            timed_out: Some(seconds),
        }
    }

    /// Simulated run time. The mock actually sleeps for it, which lets tests
    /// interleave concurrent calls.
    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// A response bound to a sub-command, optionally limited to one directory.
#[derive(Debug, Clone)]
struct Route {
    subcommand: String,
    dir_suffix: Option<PathBuf>,
    response: MockResponse,
}

impl Route {
    fn matches(&self, command: &CommandConfig) -> bool {
        if command.subcommand() != Some(self.subcommand.as_str()) {
            return false;
        }
        match (&self.dir_suffix, &command.working_dir) {
            (None, _) => true,
            (Some(suffix), Some(dir)) => dir.ends_with(suffix),
            (Some(_), None) => false,
        }
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

impl CapturedCall {
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

/// Mock command runner for testing.
///
/// Routed responses take precedence, then the sequential response list
/// (cycled), then an empty success.
#[derive(Clone)]
pub struct MockRunner {
    available: Arc<RwLock<bool>>,
    routes: Arc<RwLock<Vec<Route>>>,
    responses: Arc<RwLock<Vec<MockResponse>>>,
    response_index: Arc<AtomicUsize>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    pub fn new() -> Self {
        Self {
            available: Arc::new(RwLock::new(true)),
            routes: Arc::new(RwLock::new(Vec::new())),
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Set whether programs are reported as available.
    pub fn set_available(self, available: bool) -> Self {
        *self.available.write() = available;
        self
    }

    /// Add a mock response for the next unrouted call.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple sequential responses.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Answer every call of `subcommand` with `response`.
    pub fn on(self, subcommand: impl Into<String>, response: MockResponse) -> Self {
        self.routes.write().push(Route {
            subcommand: subcommand.into(),
            dir_suffix: None,
            response,
        });
        self
    }

    /// Answer `subcommand` calls whose working directory ends with `dir_suffix`.
    pub fn on_in(
        self,
        dir_suffix: impl Into<PathBuf>,
        subcommand: impl Into<String>,
        response: MockResponse,
    ) -> Self {
        self.routes.write().push(Route {
            subcommand: subcommand.into(),
            dir_suffix: Some(dir_suffix.into()),
            response,
        });
        self
    }

    /// Fail every run with `RunnerError::ExecutionFailed`.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a sub-command was run.
    pub fn was_called(&self, subcommand: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.subcommand() == Some(subcommand))
    }

    /// Get calls to a specific sub-command.
    pub fn get_subcommand_calls(&self, subcommand: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.subcommand() == Some(subcommand))
            .cloned()
            .collect()
    }

    fn record_call(&self, command: &CommandConfig) {
        self.captured_calls.write().push(CapturedCall {
            program: command.program.clone(),
            args: command.args.clone(),
            working_dir: command.working_dir.clone(),
            env: command.env.clone(),
        });
    }

    fn next_response(&self, command: &CommandConfig) -> MockResponse {
        if let Some(route) = self.routes.read().iter().find(|r| r.matches(command)) {
            return route.response.clone();
        }

        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }

    fn check_failure(&self) -> RunnerResult<()> {
        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(RunnerError::ExecutionFailed(msg));
        }
        Ok(())
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn is_available(&self, _program: &str) -> RunnerResult<bool> {
        Ok(*self.available.read())
    }

    async fn run(
        &self,
        command: &CommandConfig,
        _run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        self.record_call(command);
        self.check_failure()?;

        let response = self.next_response(command);
        let started_at = Utc::now();
        if response.duration_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(response.duration_ms)).await;
        }
        let finished_at = Utc::now();

        if let Some(seconds) = response.timed_out {
            return Err(RunnerError::Timeout(seconds));
        }

        Ok(ExecutionResult {
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at,
            finished_at,
            duration_ms: response.duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tf(subcommand: &str) -> CommandConfig {
        CommandConfig::new("terraform").arg(subcommand)
    }

    #[tokio::test]
    async fn test_mock_runner_basic() {
        let runner = MockRunner::new().add_response(MockResponse::success("test output"));

        let result = runner.run(&tf("version"), &RunConfig::default()).await.unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "test output");
    }

    #[tokio::test]
    async fn test_mock_runner_captures_calls() {
        let runner = MockRunner::new();

        let command = tf("init")
            .arg("-input=false")
            .working_dir("/envs/dev")
            .env("TF_LOG", "debug");
        let _ = runner.run(&command, &RunConfig::default()).await;

        let calls = runner.get_subcommand_calls("init");
        assert_eq!(calls.len(), 1);

        let call = &calls[0];
        assert_eq!(call.program, "terraform");
        assert_eq!(call.args, vec!["init".to_string(), "-input=false".to_string()]);
        assert_eq!(call.working_dir, Some(PathBuf::from("/envs/dev")));
        assert_eq!(call.env.get("TF_LOG"), Some(&"debug".to_string()));
        assert!(!runner.was_called("validate"));
    }

    #[tokio::test]
    async fn test_mock_runner_failure_simulation() {
        let runner = MockRunner::new().simulate_failure("simulated error");

        let result = runner.run(&tf("init"), &RunConfig::default()).await;
        assert!(matches!(result, Err(RunnerError::ExecutionFailed(_))));
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_runner_multiple_responses() {
        let runner = MockRunner::new().with_responses(vec![
            MockResponse::success("first"),
            MockResponse::success("second"),
            MockResponse::failure(1, "third failed"),
        ]);

        let r1 = runner.run(&tf("a"), &RunConfig::default()).await.unwrap();
        assert_eq!(r1.stdout, "first");

        let r2 = runner.run(&tf("b"), &RunConfig::default()).await.unwrap();
        assert_eq!(r2.stdout, "second");

        let r3 = runner.run(&tf("c"), &RunConfig::default()).await.unwrap();
        assert_eq!(r3.exit_code, 1);
        assert_eq!(r3.stderr, "third failed");
    }

    #[tokio::test]
    async fn test_routes_take_precedence() {
        let runner = MockRunner::new()
            .add_response(MockResponse::success("fallback"))
            .on("validate", MockResponse::success("any validate"))
            .on_in("envs/prod", "init", MockResponse::failure(1, "prod init broke"));

        let prod_init = tf("init").working_dir("/repo/envs/prod");
        let dev_init = tf("init").working_dir("/repo/envs/dev");

        let r1 = runner.run(&prod_init, &RunConfig::default()).await.unwrap();
        assert_eq!(r1.stderr, "prod init broke");

        let r2 = runner.run(&dev_init, &RunConfig::default()).await.unwrap();
        assert_eq!(r2.stdout, "fallback");

        let r3 = runner.run(&tf("validate"), &RunConfig::default()).await.unwrap();
        assert_eq!(r3.stdout, "any validate");
    }

    #[tokio::test]
    async fn test_mock_runner_availability() {
        let available = MockRunner::new().set_available(true);
        assert!(available.is_available("terraform").await.unwrap());

        let unavailable = MockRunner::new().set_available(false);
        assert!(!unavailable.is_available("terraform").await.unwrap());
    }
}
