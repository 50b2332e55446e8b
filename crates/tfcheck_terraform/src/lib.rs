//! # tfcheck_terraform
//!
//! The Terraform side of tfcheck: a narrow [`TerraformCommands`] interface
//! with exactly the two operations the environment checks need (`init` and
//! `validate`), and a [`Terraform`] implementation that runs the real binary
//! through a [`tfcheck_runner::CommandRunner`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tfcheck_runner::ProcessRunner;
//! use tfcheck_terraform::{output, Terraform, TerraformCommands, TerraformOptions};
//!
//! # async fn run() -> tfcheck_terraform::TerraformResult<()> {
//! let terraform = Terraform::new(Arc::new(ProcessRunner::default()));
//! let options = TerraformOptions::new("terraform/environments/dev").no_color(true);
//!
//! let init = terraform.init(&options).await?;
//! let validate = terraform.validate(&options).await?;
//!
//! assert!(output::contains_marker(&init, output::INIT_SUCCESS_MARKER));
//! assert!(output::contains_marker(&validate, output::VALIDATE_SUCCESS_MARKER));
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod error;
pub mod options;
pub mod output;
pub mod terraform;

pub use error::{TerraformError, TerraformResult};
pub use options::TerraformOptions;
pub use terraform::{Terraform, TerraformCommand, TerraformCommands};
