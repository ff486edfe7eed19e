//! Configuration types and loading from a standalone `junit-rerun.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod env;
mod loader;
pub use loader::ConfigLoader;

/// Conventional name of the standalone configuration file.
pub const CONFIG_FILE_NAME: &str = "junit-rerun.toml";

/// Complete configuration for a rerun.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Test runner configuration.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Classname to file resolution.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Enable verbose output.
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> crate::core::error::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Where rerun artifacts are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Report emitted by the runner for the rerun subset.
    #[serde(default = "default_rerun_output", rename = "rerun-output")]
    pub rerun_output: PathBuf,

    /// Merged report.
    #[serde(default = "default_final_output", rename = "final-output")]
    pub final_output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            rerun_output: default_rerun_output(),
            final_output: default_final_output(),
        }
    }
}

fn default_rerun_output() -> PathBuf {
    PathBuf::from("rerun_output.xml")
}

fn default_final_output() -> PathBuf {
    PathBuf::from("final_report.xml")
}

/// Runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunnerConfig {
    /// Runner type.
    #[serde(default)]
    pub kind: RunnerKind,

    /// pytest-specific configuration.
    #[serde(default)]
    pub pytest: PytestConfig,

    /// Kill the runner after this many seconds.
    pub timeout: Option<u64>,
}

/// Runner type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    /// `python -m pytest`.
    #[default]
    Pytest,
}

serde_plain::derive_display_from_serialize!(RunnerKind);

/// pytest runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PytestConfig {
    /// Python interpreter used to launch pytest.
    pub python: String,

    /// Value for `--maxfail`; high so the rerun never stops early.
    pub maxfail: u32,

    /// Value for `--tb`.
    pub traceback: String,

    /// Additional pytest arguments, placed before the targets.
    #[serde(rename = "extra-args")]
    pub extra_args: Vec<String>,
}

impl Default for PytestConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            maxfail: 1000,
            traceback: "short".to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// Classname resolution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Test source file extension, without the dot.
    pub extension: String,

    /// Directory name marking the project root; the runner is started there.
    #[serde(rename = "root-marker")]
    pub root_marker: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            extension: crate::resolve::DEFAULT_EXTENSION.to_string(),
            root_marker: crate::resolve::DEFAULT_ROOT_MARKER.to_string(),
        }
    }
}
