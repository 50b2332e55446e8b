//! tfcheck CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Assertion failure
//! - 5: Terraform invocation failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tfcheck_env::EnvError;

mod commands;

use commands::check::SuiteFailure;
use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const ASSERTION_FAILURE: u8 = 3;
    pub const INVOCATION_FAILURE: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tfcheck={},warn", level)));

    // Logs go to stderr so `--format json` output stays parseable.
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Check(args) => commands::check::execute(args).await,
        Commands::List(args) => commands::list::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            if exit_code != ExitCodes::ASSERTION_FAILURE && exit_code != ExitCodes::INVOCATION_FAILURE {
                eprintln!("❌ Error: {:#}", e);
            }
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if let Some(failure) = e.downcast_ref::<SuiteFailure>() {
        return if failure.invocation_failures > 0 {
            ExitCodes::INVOCATION_FAILURE
        } else {
            ExitCodes::ASSERTION_FAILURE
        };
    }

    match e.downcast_ref::<EnvError>() {
        Some(EnvError::UnknownEnvironment(_))
        | Some(EnvError::ConfigNotFound(_))
        | Some(EnvError::InvalidConfig(_))
        | Some(EnvError::Yaml(_)) => ExitCodes::INVALID_ARGS,
        Some(EnvError::Invocation { .. }) => ExitCodes::INVOCATION_FAILURE,
        _ => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_suite_failures_map_to_exit_codes() {
        let invocation = anyhow::Error::new(SuiteFailure {
            invocation_failures: 1,
            assertion_failures: 1,
        });
        assert_eq!(categorize_error(&invocation), ExitCodes::INVOCATION_FAILURE);

        let assertion = anyhow::Error::new(SuiteFailure {
            invocation_failures: 0,
            assertion_failures: 2,
        });
        assert_eq!(categorize_error(&assertion), ExitCodes::ASSERTION_FAILURE);
    }

    #[test]
    fn test_config_errors_are_invalid_args() {
        let err = anyhow::Error::new(EnvError::ConfigNotFound(PathBuf::from("tfcheck.yaml")))
            .context("Failed to load suite configuration");
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_ARGS);
    }

    #[test]
    fn test_other_errors_are_general() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
    }
}
