//! # tfcheck_env
//!
//! Environment validation for tfcheck.
//!
//! Each environment (dev, staging, prod) owns a Terraform configuration
//! directory. A check runs `terraform init`, then `terraform validate`, then
//! looks for the success markers in their output. Checks of different
//! environments are independent and can run concurrently.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tfcheck_env::{Environment, EnvironmentValidator, SuiteConfig};
//! use tfcheck_runner::ProcessRunner;
//! use tfcheck_terraform::Terraform;
//!
//! # async fn run() -> tfcheck_env::EnvResult<()> {
//! let config = SuiteConfig::load_or_default(None)?;
//! let terraform = Terraform::new(Arc::new(ProcessRunner::default()));
//! let validator = EnvironmentValidator::new(Arc::new(terraform), config);
//!
//! let suite = validator.check_all(Environment::all()).await;
//! assert!(suite.passed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod environment;
pub mod error;
pub mod report;
pub mod validator;

pub use config::{EnvironmentSettings, ExecutionConfig, ExecutionMode, SuiteConfig};
pub use environment::Environment;
pub use error::{EnvError, EnvResult};
pub use report::{EnvironmentOutcome, EnvironmentReport, SuiteReport, ValidationCheck};
pub use validator::EnvironmentValidator;
