//! Host process runner.
//!
//! Spawns the program directly on the host, drains stdout and stderr on
//! dedicated reader threads and enforces the run timeout by polling the
//! child. The blocking work happens on tokio's blocking pool so several
//! checks can be in flight at once.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info};

use crate::config::{CommandConfig, RunConfig};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandRunner, ExecutionResult};

/// Log output from command execution.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub timestamp: chrono::DateTime<Utc>,
    pub stream: LogStream,
    pub message: String,
}

/// Log stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Log handler callback type.
pub type LogHandler = Arc<dyn Fn(LogLine) + Send + Sync>;

/// Process runner options.
#[derive(Debug, Clone)]
pub struct ProcessRunnerOptions {
    /// Dry-run mode (log commands without executing)
    pub dry_run: bool,
    /// CI mode (timestamped log lines)
    pub ci_mode: bool,
}

impl Default for ProcessRunnerOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            ci_mode: std::env::var("CI").is_ok(),
        }
    }
}

impl ProcessRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn ci_mode(mut self) -> Self {
        self.ci_mode = true;
        self
    }
}

/// Runs commands as host processes.
#[derive(Clone)]
pub struct ProcessRunner {
    options: ProcessRunnerOptions,
    log_handler: Option<LogHandler>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(ProcessRunnerOptions::default())
    }
}

impl ProcessRunner {
    pub fn new(options: ProcessRunnerOptions) -> Self {
        Self {
            options,
            log_handler: None,
        }
    }

    /// Set a log handler for streamed lines.
    pub fn with_log_handler(mut self, handler: LogHandler) -> Self {
        self.log_handler = Some(handler);
        self
    }

    /// Check if dry-run mode is enabled.
    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Check whether a program answers `--version`.
    pub fn is_program_available(program: &str) -> bool {
        Command::new(program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// Spawn the child, collect its output and wait for it within the timeout.
fn execute(
    command: &CommandConfig,
    run_config: &RunConfig,
    ci_mode: bool,
    log_handler: Option<LogHandler>,
) -> RunnerResult<(i64, String, String)> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .envs(&command.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &command.working_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RunnerError::ProgramNotFound(command.program.clone()),
        _ => RunnerError::SpawnFailed {
            program: command.program.clone(),
            message: e.to_string(),
        },
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| RunnerError::ExecutionFailed("stdout was not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| RunnerError::ExecutionFailed("stderr was not captured".to_string()))?;

    let stdout_handle = drain(stdout, LogStream::Stdout, run_config.stream_logs, ci_mode, log_handler.clone());
    let stderr_handle = drain(stderr, LogStream::Stderr, run_config.stream_logs, ci_mode, log_handler);

    let status = if run_config.timeout_seconds > 0 {
        let timeout = Duration::from_secs(run_config.timeout_seconds);
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() > timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(RunnerError::Timeout(run_config.timeout_seconds));
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    return Err(RunnerError::ExecutionFailed(format!(
                        "Failed to wait for process: {}",
                        e
                    )));
                }
            }
        }
    } else {
        child.wait().map_err(|e| {
            RunnerError::ExecutionFailed(format!("Failed to wait for process: {}", e))
        })?
    };

    let stdout_output = stdout_handle.join().unwrap_or_default();
    let stderr_output = stderr_handle.join().unwrap_or_default();

    let exit_code = status.code().map(i64::from).unwrap_or(-1);

    Ok((exit_code, stdout_output, stderr_output))
}

/// Read a pipe to the end on its own thread, optionally echoing each line.
fn drain<R: Read + Send + 'static>(
    pipe: R,
    stream: LogStream,
    stream_logs: bool,
    ci_mode: bool,
    log_handler: Option<LogHandler>,
) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut output = String::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            // Tools may print bytes that are not UTF-8; keep reading past them.
            let line = String::from_utf8_lossy(&buf)
                .trim_end_matches(&['\n', '\r'][..])
                .to_string();
            output.push_str(&line);
            output.push('\n');
            if !stream_logs {
                continue;
            }
            let log_line = LogLine {
                timestamp: Utc::now(),
                stream,
                message: line,
            };
            if ci_mode {
                println!(
                    "[{}] [{}] {}",
                    log_line.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                    log_line.stream,
                    log_line.message
                );
            } else {
                match stream {
                    LogStream::Stdout => println!("{}", log_line.message),
                    LogStream::Stderr => eprintln!("{}", log_line.message),
                }
            }
            if let Some(handler) = &log_handler {
                handler(log_line);
            }
        }
        output
    })
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn is_available(&self, program: &str) -> RunnerResult<bool> {
        let program = program.to_string();
        tokio::task::spawn_blocking(move || Self::is_program_available(&program))
            .await
            .map_err(|e| RunnerError::ExecutionFailed(e.to_string()))
    }

    async fn run(
        &self,
        command: &CommandConfig,
        run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        let cmd_str = command.display();

        if self.options.dry_run {
            info!("[DRY-RUN] Would execute: {}", cmd_str);
            return Ok(ExecutionResult {
                exit_code: 0,
                stdout: format!("[DRY-RUN] Command: {}", cmd_str),
                stderr: String::new(),
                started_at: Utc::now(),
                finished_at: Utc::now(),
                duration_ms: 0,
            });
        }

        if let Some(dir) = &command.working_dir {
            if !dir.is_dir() {
                return Err(RunnerError::WorkingDirNotFound(dir.clone()));
            }
        }

        debug!("Executing: {} (in {:?})", cmd_str, command.working_dir);

        let started_at = Utc::now();
        let (exit_code, stdout, stderr) = {
            let command = command.clone();
            let run_config = run_config.clone();
            let ci_mode = self.options.ci_mode;
            let log_handler = self.log_handler.clone();
            tokio::task::spawn_blocking(move || execute(&command, &run_config, ci_mode, log_handler))
                .await
                .map_err(|e| RunnerError::ExecutionFailed(format!("Command task failed: {}", e)))??
        };
        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;

        if exit_code == 0 {
            info!("{} completed successfully in {}ms", command.program, duration_ms);
        } else {
            error!(
                "{} failed with exit code {} after {}ms",
                command.program, exit_code, duration_ms
            );
        }

        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
            started_at,
            finished_at,
            duration_ms,
        })
    }
}
