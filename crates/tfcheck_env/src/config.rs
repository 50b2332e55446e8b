//! Suite configuration (`tfcheck.yaml`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use tfcheck_runner::{ContainerImage, ContainerRuntime};
use tfcheck_terraform::TerraformOptions;

use crate::environment::Environment;
use crate::error::{EnvError, EnvResult};

/// Where terraform runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// The terraform binary on the host PATH
    #[default]
    Host,
    /// A terraform image run through docker or podman
    Container,
}

/// Execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    /// Container image (container mode only)
    pub image: String,
    /// Container image tag (container mode only)
    pub tag: String,
    /// Preferred container runtime; auto-detected when unset
    pub runtime: Option<ContainerRuntime>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Host,
            image: ContainerImage::TERRAFORM.to_string(),
            tag: ContainerImage::TERRAFORM_TAG.to_string(),
            runtime: None,
        }
    }
}

impl ExecutionConfig {
    pub fn container_image(&self) -> ContainerImage {
        ContainerImage::new(&self.image, &self.tag)
    }
}

/// Per-environment overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    /// Replaces `<root>/<environment>`
    pub directory: Option<PathBuf>,
    pub vars: BTreeMap<String, Value>,
    pub var_files: Vec<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub backend_config: BTreeMap<String, String>,
    pub upgrade: bool,
    /// Check init/validate output for the success markers
    pub assert_markers: bool,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            directory: None,
            vars: BTreeMap::new(),
            var_files: Vec::new(),
            env: BTreeMap::new(),
            backend_config: BTreeMap::new(),
            upgrade: false,
            assert_markers: true,
        }
    }
}

/// Top-level suite configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Directory holding one sub-directory per environment
    pub root: PathBuf,
    pub terraform_binary: String,
    pub no_color: bool,
    pub timeout_seconds: u64,
    pub execution: ExecutionConfig,
    pub environments: BTreeMap<Environment, EnvironmentSettings>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(Environment::DEFAULT_ROOT),
            terraform_binary: TerraformOptions::DEFAULT_BINARY.to_string(),
            no_color: true,
            timeout_seconds: TerraformOptions::DEFAULT_TIMEOUT_SECONDS,
            execution: ExecutionConfig::default(),
            environments: BTreeMap::new(),
        }
    }
}

impl SuiteConfig {
    pub const FILE_NAME: &'static str = "tfcheck.yaml";

    /// Parse a configuration document. Relative paths stay relative.
    pub fn from_yaml(yaml: &str) -> EnvResult<Self> {
        let config: SuiteConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// Relative `root`, `directory` and `var_files` entries resolve against
    /// the file's directory. Var files become absolute because terraform
    /// reads them from the environment directory.
    pub fn load(path: &Path) -> EnvResult<Self> {
        if !path.is_file() {
            return Err(EnvError::ConfigNotFound(path.to_path_buf()));
        }
        debug!("Loading suite config from {:?}", path);

        let content = fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let base = if base.is_absolute() {
            base.to_path_buf()
        } else {
            std::env::current_dir()?.join(base)
        };
        Ok(config.relative_to(&base))
    }

    /// Load `path` if given, else `./tfcheck.yaml` if present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> EnvResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(Self::FILE_NAME);
                if local.is_file() {
                    Self::load(local)
                } else {
                    info!("No {} found, using defaults", Self::FILE_NAME);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    pub fn with_settings(mut self, environment: Environment, settings: EnvironmentSettings) -> Self {
        self.environments.insert(environment, settings);
        self
    }

    /// Turn marker assertions off for every environment.
    pub fn without_marker_assertions(mut self) -> Self {
        for environment in Environment::all() {
            self.environments
                .entry(*environment)
                .or_default()
                .assert_markers = false;
        }
        self
    }

    pub fn settings(&self, environment: Environment) -> EnvironmentSettings {
        self.environments
            .get(&environment)
            .cloned()
            .unwrap_or_default()
    }

    pub fn directory_for(&self, environment: Environment) -> PathBuf {
        self.environments
            .get(&environment)
            .and_then(|s| s.directory.clone())
            .unwrap_or_else(|| environment.directory(&self.root))
    }

    /// Build the terraform options for one environment check.
    pub fn options_for(&self, environment: Environment) -> TerraformOptions {
        let settings = self.settings(environment);

        let mut options = TerraformOptions::new(self.directory_for(environment))
            .binary(&self.terraform_binary)
            .no_color(self.no_color)
            .upgrade(settings.upgrade)
            .timeout(self.timeout_seconds)
            .vars(settings.vars);
        for file in settings.var_files {
            options = options.var_file(file);
        }
        for (key, value) in settings.env {
            options = options.env_var(key, value);
        }
        for (key, value) in settings.backend_config {
            options = options.backend_config(key, value);
        }
        options
    }

    fn validate(&self) -> EnvResult<()> {
        if self.terraform_binary.trim().is_empty() {
            return Err(EnvError::InvalidConfig(
                "terraform_binary must not be empty".to_string(),
            ));
        }
        if self.execution.mode == ExecutionMode::Container && self.execution.image.trim().is_empty() {
            return Err(EnvError::InvalidConfig(
                "execution.image is required in container mode".to_string(),
            ));
        }
        Ok(())
    }

    fn relative_to(mut self, base: &Path) -> Self {
        if self.root.is_relative() {
            self.root = base.join(&self.root);
        }
        for settings in self.environments.values_mut() {
            if let Some(dir) = settings.directory.take() {
                settings.directory = Some(if dir.is_relative() { base.join(dir) } else { dir });
            }
            for file in settings.var_files.iter_mut() {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }
        self
    }
}
