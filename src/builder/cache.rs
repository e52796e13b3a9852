//! Build directories and the persistent sub-build cache.
//!
//! The compiler-infrastructure sub-build is expensive, so its build tree lives
//! outside the project in `<cache-root>/llvm-<mode>` and survives across runs.
//! Debug and Release never share a cache directory.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::builder::errors::BuildError;

/// Prefix of the mode-qualified sub-build cache directory.
pub const CACHE_DIR_PREFIX: &str = "llvm";

/// Build mode of the native extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum BuildMode {
    Debug,
    #[default]
    Release,
}

impl BuildMode {
    /// Both modes, in a fixed order.
    pub const ALL: [BuildMode; 2] = [BuildMode::Debug, BuildMode::Release];

    /// The CMake configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Debug => "Debug",
            BuildMode::Release => "Release",
        }
    }

    /// Lowercase name used in directory names.
    pub fn dir_name(self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Release => "release",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(BuildMode::Debug),
            "release" => Ok(BuildMode::Release),
            _ => Err(format!(
                "invalid build mode '{}'; expected 'debug' or 'release'",
                s
            )),
        }
    }
}

/// Directories for one orchestration run.
///
/// `output_dir` receives the finished artifact, `scratch_dir` is the build
/// tool's working directory, and `cache_dir` holds the mode-keyed sub-build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
    pub mode: BuildMode,
    pub output_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub cache_dir: PathBuf,
}

/// Allocates the directories a run needs.
#[derive(Debug, Clone)]
pub struct BuildCache {
    cache_root: PathBuf,
    scratch_dir: PathBuf,
    output_dir: PathBuf,
}

impl BuildCache {
    /// A cache rooted in `cache_root` (normally the system temp dir).
    pub fn new(cache_root: PathBuf, scratch_dir: PathBuf, output_dir: PathBuf) -> Self {
        BuildCache {
            cache_root,
            scratch_dir,
            output_dir,
        }
    }

    /// A cache rooted in the system temp dir.
    pub fn in_temp_dir(scratch_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self::new(std::env::temp_dir(), scratch_dir, output_dir)
    }

    /// The sub-build cache directory for `mode`.
    pub fn cache_dir(&self, mode: BuildMode) -> PathBuf {
        cache_dir_in(&self.cache_root, mode)
    }

    /// Compute the configuration for `mode` without touching the filesystem.
    pub fn configuration(&self, mode: BuildMode) -> BuildConfiguration {
        BuildConfiguration {
            mode,
            output_dir: self.output_dir.clone(),
            scratch_dir: self.scratch_dir.clone(),
            cache_dir: self.cache_dir(mode),
        }
    }

    /// Compute the configuration for `mode` and create its directories.
    ///
    /// Idempotent: existing directories are reused as-is.
    pub fn prepare(&self, mode: BuildMode) -> Result<BuildConfiguration, BuildError> {
        let config = self.configuration(mode);

        for dir in [&config.scratch_dir, &config.cache_dir, &config.output_dir] {
            create_dir(dir)?;
        }

        tracing::debug!(
            "prepared {} directories: scratch={} cache={}",
            mode.dir_name(),
            config.scratch_dir.display(),
            config.cache_dir.display()
        );

        Ok(config)
    }
}

/// `<root>/llvm-<mode>`.
pub fn cache_dir_in(root: &Path, mode: BuildMode) -> PathBuf {
    root.join(format!("{}-{}", CACHE_DIR_PREFIX, mode.dir_name()))
}

fn create_dir(path: &Path) -> Result<(), BuildError> {
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(source) => Err(BuildError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}
