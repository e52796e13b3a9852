//! Global context for Anvil operations.
//!
//! Provides centralized access to the working directory, configuration file
//! locations and output preferences.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::project::{ManifestError, MANIFEST_NAME};
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Global context containing configuration paths and output settings.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Global config file (~/.anvil/config.toml), if a home directory exists
    global_config: Option<PathBuf>,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext for the process's working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            global_config: global_config_path(),
            verbose: false,
            color: true,
        }
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Load the merged global and project configuration for a project root.
    pub fn load_config(&self, project_root: &Path) -> Config {
        let global = self.global_config.clone().unwrap_or_default();
        load_config(&global, &project_config_path(project_root))
    }

    /// Find `Anvil.toml` starting from cwd and searching upward.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(MANIFEST_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                return Err(ManifestError::NotFound {
                    dir: self.cwd.clone(),
                });
            }
        }
    }
}
