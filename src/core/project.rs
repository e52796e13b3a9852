//! Project - the manifest plus the directories derived from it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::builder::platform::HostPlatform;
use crate::core::manifest::Manifest;
use crate::util::fs::normalize_path;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "Anvil.toml";

/// Error locating the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `{MANIFEST_NAME}` in `{}` or any parent directory", .dir.display())]
    NotFound { dir: PathBuf },
}

/// A package project rooted at the directory holding `Anvil.toml`.
#[derive(Debug, Clone)]
pub struct Project {
    manifest: Manifest,
    root: PathBuf,
    host_tag: String,
}

impl Project {
    /// Load a project from its manifest path.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        let root = manifest_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        Ok(Self::new(manifest, root))
    }

    /// A project for an already-parsed manifest.
    pub fn new(manifest: Manifest, root: PathBuf) -> Self {
        Project {
            manifest,
            root,
            host_tag: HostPlatform::current().tag(),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Directory containing `Anvil.toml`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/build`.
    pub fn build_root(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Staging directory the installable package is assembled in.
    pub fn build_lib(&self) -> PathBuf {
        self.build_root().join(format!("lib.{}", self.host_tag))
    }

    /// Default working directory of the build tool.
    pub fn build_temp(&self) -> PathBuf {
        self.build_root().join(format!("temp.{}", self.host_tag))
    }

    /// Directory the native extension is written to.
    pub fn extension_output_dir(&self) -> PathBuf {
        self.build_lib().join(&self.manifest.extension.path)
    }

    /// CMake source directory: the override when given, else the manifest's.
    pub fn base_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        let dir = match override_dir {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => self.root.join(dir),
            None => self.root.join(&self.manifest.extension.source_dir),
        };
        normalize_path(&dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_manifest, write_sample_project};
    use tempfile::TempDir;

    #[test]
    fn test_project_paths() {
        let project = Project::new(sample_manifest(), PathBuf::from("/proj/python"));

        assert!(project.build_lib().starts_with("/proj/python/build"));
        assert!(project
            .build_lib()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("lib."));
        assert!(project.extension_output_dir().ends_with("triton/_C"));
        assert_ne!(project.build_temp(), project.build_lib());
    }

    #[test]
    fn test_base_dir_defaults_to_manifest_source_dir() {
        let tmp = TempDir::new().unwrap();
        let manifest_path = write_sample_project(tmp.path());
        let project = Project::load(&manifest_path).unwrap();

        assert_eq!(project.base_dir(None), normalize_path(tmp.path()));
    }

    #[test]
    fn test_base_dir_override() {
        let tmp = TempDir::new().unwrap();
        let manifest_path = write_sample_project(tmp.path());
        let project = Project::load(&manifest_path).unwrap();

        let other = tmp.path().join("elsewhere");
        std::fs::create_dir_all(&other).unwrap();
        assert_eq!(project.base_dir(Some(&other)), normalize_path(&other));
    }

    #[test]
    fn test_not_found_message() {
        let err = ManifestError::NotFound {
            dir: PathBuf::from("/somewhere"),
        };
        assert!(err.to_string().contains("Anvil.toml"));
    }
}
