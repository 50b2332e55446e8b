//! Per-invocation Terraform options.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

/// Everything needed to run Terraform against one configuration directory.
///
/// Built once per check and then only read; the builder methods consume
/// `self`.
#[derive(Debug, Clone, PartialEq)]
pub struct TerraformOptions {
    /// Directory holding the configuration bundle
    pub terraform_dir: PathBuf,
    /// Variable overrides, passed as `-var name=value`
    pub vars: BTreeMap<String, Value>,
    /// Variable files, passed as `-var-file=path`
    pub var_files: Vec<PathBuf>,
    /// Environment variables for the terraform process
    pub env_vars: BTreeMap<String, String>,
    /// Backend settings, passed to `init` as `-backend-config=key=value`
    pub backend_config: BTreeMap<String, String>,
    /// Ask terraform not to emit ANSI colors
    pub no_color: bool,
    /// Let `init` upgrade modules and providers
    pub upgrade: bool,
    /// Terraform executable
    pub binary: String,
    /// Per-invocation timeout in seconds (0 = none)
    pub timeout_seconds: u64,
}

impl TerraformOptions {
    pub const DEFAULT_BINARY: &'static str = "terraform";
    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 600;

    pub fn new(terraform_dir: impl Into<PathBuf>) -> Self {
        Self {
            terraform_dir: terraform_dir.into(),
            vars: BTreeMap::new(),
            var_files: Vec::new(),
            env_vars: BTreeMap::new(),
            backend_config: BTreeMap::new(),
            no_color: false,
            upgrade: false,
            binary: Self::DEFAULT_BINARY.to_string(),
            timeout_seconds: Self::DEFAULT_TIMEOUT_SECONDS,
        }
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn vars(mut self, vars: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.vars.extend(vars);
        self
    }

    pub fn var_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.var_files.push(path.into());
        self
    }

    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn backend_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.backend_config.insert(key.into(), value.into());
        self
    }

    pub fn no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    pub fn upgrade(mut self, upgrade: bool) -> Self {
        self.upgrade = upgrade;
        self
    }

    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.terraform_dir
    }
}
