//! CLI command definitions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tfcheck_env::{Environment, SuiteConfig};

pub mod check;
pub mod list;

/// tfcheck - init and validate Terraform environments
#[derive(Parser)]
#[command(name = "tfcheck")]
#[command(version, about = "tfcheck - init and validate Terraform environments")]
#[command(long_about = r#"
tfcheck runs `terraform init` followed by `terraform validate` in the
configuration directory of each environment (dev, staging, prod) and checks
their output for Terraform's success messages. Nothing is planned or applied.

COMMANDS:
  check  → Initialize and validate environments
  list   → Show environments and their directories

CONFIGURATION:
  tfcheck.yaml in the current directory, or the file named by --config or
  TFCHECK_CONFIG. Without one, environments live under terraform/environments.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Assertion failure
  5 - Terraform invocation failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run init and validate for each environment
    Check(check::CheckArgs),

    /// List environments and their resolved directories
    List(list::ListArgs),
}

/// Parse an environment name, accepting the long aliases.
pub fn parse_environment(value: &str) -> Result<Environment, String> {
    value.parse::<Environment>().map_err(|e| e.to_string())
}

/// Load the suite configuration and apply a `--root` override.
pub fn load_config(path: Option<&Path>, root: Option<PathBuf>) -> Result<SuiteConfig> {
    let config = SuiteConfig::load_or_default(path).context("Failed to load suite configuration")?;
    Ok(match root {
        Some(root) => config.with_root(root),
        None => config,
    })
}
