//! Deployment environments.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EnvError;

/// A named deployment target with its own configuration directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[serde(alias = "development")]
    Dev,
    #[serde(alias = "stage")]
    Staging,
    #[serde(alias = "production")]
    Prod,
}

impl Environment {
    /// Default location of the environment directories, relative to the repository root.
    pub const DEFAULT_ROOT: &'static str = "terraform/environments";

    pub fn all() -> &'static [Environment] {
        &[Environment::Dev, Environment::Staging, Environment::Prod]
    }

    /// Directory name under the environments root.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Environment::Dev => "development",
            Environment::Staging => "staging",
            Environment::Prod => "production",
        }
    }

    pub fn directory(&self, root: &Path) -> PathBuf {
        root.join(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "staging" | "stage" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(EnvError::UnknownEnvironment(other.to_string())),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("Development".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("stage".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!(" PROD ".parse::<Environment>().unwrap(), Environment::Prod);
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Prod);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "qa".parse::<Environment>().unwrap_err();
        assert!(matches!(err, EnvError::UnknownEnvironment(ref name) if name == "qa"));
    }

    #[test]
    fn test_directories_are_disjoint() {
        let root = Path::new(Environment::DEFAULT_ROOT);
        let dirs: Vec<PathBuf> = Environment::all().iter().map(|e| e.directory(root)).collect();

        assert_eq!(dirs[0], PathBuf::from("terraform/environments/dev"));
        assert_eq!(dirs[1], PathBuf::from("terraform/environments/staging"));
        assert_eq!(dirs[2], PathBuf::from("terraform/environments/prod"));
    }

    #[test]
    fn test_serde_names() {
        let yaml = serde_yaml::to_string(&Environment::Prod).unwrap();
        assert_eq!(yaml.trim(), "prod");

        let parsed: Environment = serde_yaml::from_str("production").unwrap();
        assert_eq!(parsed, Environment::Prod);
    }
}
