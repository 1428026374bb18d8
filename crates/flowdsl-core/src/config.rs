//! Project configuration
//!
//! An optional `flowdsl.yaml` holds compile defaults for a directory of
//! workflow sources. Every field has a default, so an empty file is valid.
//!
//! ```yaml
//! layout:
//!   auto: true
//!   start: [0, 0]
//!   spacing: 200
//! validation:
//!   strict: false
//!   validate_output: true
//! params:
//!   base_url: "https://api.example.com"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name looked up when a directory is given
pub const CONFIG_FILE: &str = "flowdsl.yaml";

/// Root configuration from `flowdsl.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Node placement
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Validation policy
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Parameter overrides keyed by parameter name
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

/// Node placement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Place nodes without an explicit position automatically
    #[serde(default = "default_auto")]
    pub auto: bool,

    /// Position of the first auto-placed node
    #[serde(default)]
    pub start: [f64; 2],

    /// Horizontal distance between auto-placed nodes
    #[serde(default = "default_spacing")]
    pub spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            auto: default_auto(),
            start: [0.0, 0.0],
            spacing: default_spacing(),
        }
    }
}

fn default_auto() -> bool {
    true
}

fn default_spacing() -> f64 {
    200.0
}

/// Validation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Treat warnings as failures
    #[serde(default)]
    pub strict: bool,

    /// Run the graph pass on generated documents
    #[serde(default = "default_validate_output")]
    pub validate_output: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict: false,
            validate_output: default_validate_output(),
        }
    }
}

fn default_validate_output() -> bool {
    true
}

/// Loaded configuration plus where it came from
#[derive(Debug, Clone)]
pub struct Config {
    /// Parsed configuration
    pub project: ProjectConfig,

    /// Directory containing the configuration file
    pub base_path: PathBuf,
}

impl Config {
    /// Load configuration from a directory or a file path.
    ///
    /// ```rust,ignore
    /// let config = Config::load("./workflows")?;
    /// println!("spacing: {}", config.project.layout.spacing);
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let (config_path, base_path) = if path.is_dir() {
            (path.join(CONFIG_FILE), path.to_path_buf())
        } else {
            (
                path.to_path_buf(),
                path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            )
        };

        if !config_path.exists() {
            return Err(Error::ConfigNotFound {
                path: config_path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let project = Self::parse(&contents)?;
        tracing::debug!("Loaded configuration from {}", config_path.display());

        Ok(Self { project, base_path })
    }

    /// Load configuration if the file exists, otherwise use defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load(path.as_ref()) {
            Err(Error::ConfigNotFound { path: missing }) => {
                tracing::debug!("No configuration at {}, using defaults", missing);
                let base_path = if path.as_ref().is_dir() {
                    path.as_ref().to_path_buf()
                } else {
                    path.as_ref()
                        .parent()
                        .unwrap_or(Path::new("."))
                        .to_path_buf()
                };
                Ok(Self {
                    project: ProjectConfig::default(),
                    base_path,
                })
            }
            other => other,
        }
    }

    /// Parse configuration text. Empty text yields the defaults.
    pub fn parse(contents: &str) -> Result<ProjectConfig> {
        if contents.trim().is_empty() {
            return Ok(ProjectConfig::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }
}
