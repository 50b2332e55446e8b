//! List command - Show environments and where they live.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use tfcheck_env::{Environment, ExecutionMode, SuiteConfig};

use super::load_config;

#[derive(Args)]
pub struct ListArgs {
    /// Suite configuration file
    #[arg(short, long, env = "TFCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding one sub-directory per environment
    #[arg(long)]
    pub root: Option<PathBuf>,
}

pub async fn execute(args: ListArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.root)?;

    println!("📂 Environments");
    println!();
    for line in describe(&config) {
        println!("{}", line);
    }

    if config.execution.mode == ExecutionMode::Container {
        println!();
        println!("🐳 Terraform runs in {}", config.execution.container_image().full_image());
    }

    Ok(())
}

fn describe(config: &SuiteConfig) -> Vec<String> {
    Environment::all()
        .iter()
        .map(|environment| {
            let directory = config.directory_for(*environment);
            let icon = if directory.is_dir() { "✅" } else { "⚠️ " };
            let settings = config.settings(*environment);
            let mut line = format!(
                "{} {:<8} {}",
                icon,
                environment.as_str(),
                directory.display()
            );
            if !settings.vars.is_empty() {
                line.push_str(&format!(" ({} var(s))", settings.vars.len()));
            }
            if !settings.assert_markers {
                line.push_str(" [no marker assertions]");
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_describe_marks_missing_directories() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("dev")).unwrap();

        let config = SuiteConfig::default().with_root(root.path());
        let lines = describe(&config);

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("✅ dev"));
        assert!(lines[1].starts_with("⚠️  staging"));
        assert!(lines[2].contains("prod"));
    }
}
