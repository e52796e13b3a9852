//! Anvil.toml manifest parsing and schema.
//!
//! The manifest declares the installable package: its metadata, the
//! interpreter sub-packages to ship, data files matched by glob, and where the
//! compiled native extension lands inside the package.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

/// The `[package]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub version: Version,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub homepage: Option<String>,

    #[serde(default)]
    pub download_url: Option<String>,

    #[serde(default)]
    pub classifiers: Vec<String>,

    /// Interpreter package directories to ship, relative to the project root
    #[serde(default)]
    pub packages: Vec<String>,

    /// Runtime requirements
    #[serde(default)]
    pub install_requires: Vec<String>,

    /// Package directory -> glob patterns of non-source files to bundle
    #[serde(default)]
    pub data: BTreeMap<String, Vec<String>>,

    /// Entry point group -> `name = module:function` specs
    #[serde(default)]
    pub entry_points: BTreeMap<String, Vec<String>>,
}

/// The `[extension]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionSpec {
    /// Stem of the compiled artifact (`lib<name>.so`, `<name>.pyd`, ...)
    pub name: String,

    /// Installed location of the artifact inside the package
    pub path: PathBuf,

    /// CMake source directory, relative to the project root
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

/// The parsed Anvil.toml manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub package: PackageMetadata,
    pub extension: ExtensionSpec,
}

impl Manifest {
    /// Load and validate a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&contents).with_context(|| format!("invalid manifest: {}", path.display()))
    }

    /// Parse and validate manifest text.
    pub fn parse(contents: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.package.name.trim().is_empty() {
            bail!("`package.name` must not be empty");
        }
        if self.extension.name.trim().is_empty() {
            bail!("`extension.name` must not be empty");
        }
        if self.extension.path.is_absolute() {
            bail!(
                "`extension.path` must be relative to the package root, got {}",
                self.extension.path.display()
            );
        }
        for dir in self.package.data.keys() {
            if !self.package.packages.iter().any(|p| p == dir) {
                tracing::warn!("data files declared for `{}`, which is not in `packages`", dir);
            }
        }
        for (group, specs) in &self.package.entry_points {
            for spec in specs {
                if !spec.contains('=') {
                    bail!(
                        "entry point `{}` in group `{}` must look like `name = module:function`",
                        spec,
                        group
                    );
                }
            }
        }
        Ok(())
    }
}
