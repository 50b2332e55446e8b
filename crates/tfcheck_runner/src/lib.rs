//! # tfcheck_runner
//!
//! Subprocess execution wrapper for tfcheck.
//!
//! Every call into an external tool goes through the [`CommandRunner`]
//! trait, so the layers above never touch `std::process` directly and can
//! be driven by a scripted [`MockRunner`] in tests.
//!
//! # Features
//!
//! - **Host Processes**: [`ProcessRunner`] spawns the program directly
//! - **Containers**: [`ContainerCommandRunner`] wraps the call in `docker run` / `podman run`
//! - **Runtime Detection**: Auto-detect Docker vs Podman
//! - **Dry-Run Mode**: Log commands without execution
//! - **CI Integration**: Timestamped log lines when `CI` is set
//! - **Mock Runner**: Scripted responses and captured calls for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use tfcheck_runner::{CommandConfig, CommandRunner, ProcessRunner, ProcessRunnerOptions, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = ProcessRunner::new(ProcessRunnerOptions::default());
//!
//!     let command = CommandConfig::new("terraform")
//!         .arg("validate")
//!         .arg("-no-color")
//!         .working_dir("terraform/environments/dev");
//!
//!     let result = runner.run(&command, &RunConfig::default()).await?;
//!     println!("Exit code: {}", result.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod mock;
pub mod process;
pub mod runner;

pub use config::{CommandConfig, ContainerImage, RunConfig};
pub use container::{ContainerCommandRunner, ContainerRuntime};
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use process::{LogHandler, LogLine, LogStream, ProcessRunner, ProcessRunnerOptions};
pub use runner::{CommandRunner, ExecutionResult};
