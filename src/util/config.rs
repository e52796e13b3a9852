//! Configuration file support for Anvil.
//!
//! Anvil reads two configuration file locations:
//! - Global: `~/.anvil/config.toml` - User-wide defaults
//! - Project: `.anvil/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Neither file is
//! required, and a file that fails to parse is ignored with a warning.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::cache::BuildMode;

/// Anvil configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildSettings,

    /// Sub-build cache settings
    pub cache: CacheSettings,

    /// Build tool settings
    pub toolchain: ToolchainSettings,

    /// Host interpreter settings
    pub python: PythonSettings,

    /// Accelerator SDK roots
    pub accelerator: AcceleratorSettings,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Build the extension in debug mode
    pub debug: Option<bool>,

    /// Override for the build tool's working directory
    pub build_temp: Option<PathBuf>,
}

/// Cache-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Directory holding `llvm-<mode>` caches (defaults to the system temp dir)
    pub root: Option<PathBuf>,
}

/// Build tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Explicit path to cmake
    pub cmake: Option<PathBuf>,
}

/// Interpreter configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonSettings {
    /// Explicit interpreter path
    pub executable: Option<PathBuf>,
}

/// Accelerator SDK configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceleratorSettings {
    /// CUDA toolkit root (defaults to /usr/local/cuda)
    pub cuda_root: Option<PathBuf>,

    /// ROCm root (defaults to /opt/rocm)
    pub rocm_root: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.debug.is_some() {
            self.build.debug = other.build.debug;
        }
        if other.build.build_temp.is_some() {
            self.build.build_temp = other.build.build_temp;
        }
        if other.cache.root.is_some() {
            self.cache.root = other.cache.root;
        }
        if other.toolchain.cmake.is_some() {
            self.toolchain.cmake = other.toolchain.cmake;
        }
        if other.python.executable.is_some() {
            self.python.executable = other.python.executable;
        }
        if other.accelerator.cuda_root.is_some() {
            self.accelerator.cuda_root = other.accelerator.cuda_root;
        }
        if other.accelerator.rocm_root.is_some() {
            self.accelerator.rocm_root = other.accelerator.rocm_root;
        }
    }

    /// The build mode selected by `build.debug` (release unless set).
    pub fn mode(&self) -> BuildMode {
        if self.build.debug.unwrap_or(false) {
            BuildMode::Debug
        } else {
            BuildMode::Release
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.anvil/config.toml)
/// 2. Global config (~/.anvil/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global anvil config directory (~/.anvil).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".anvil"))
}

/// Get the global config path (~/.anvil/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.anvil/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".anvil").join("config.toml")
}
