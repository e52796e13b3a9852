//! Build tool detection.
//!
//! The native extension is built with CMake. Before anything else runs, the
//! tool's `--version` output is queried once and the result is carried through
//! the rest of the run as an immutable [`ToolchainInfo`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use serde::Serialize;

use crate::builder::errors::BuildError;
use crate::builder::platform::{HostPlatform, OsFamily};
use crate::util::process::{find_cmake, Executor, ProcessBuilder};

/// Name of the external build tool.
pub const CMAKE: &str = "cmake";

/// Oldest CMake accepted on Windows. No minimum is enforced elsewhere.
pub const WINDOWS_MIN_CMAKE: Version = Version::new(3, 1, 0);

static VERSION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"version\s*([\d.]+)").ok());

/// Result of probing the build tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainInfo {
    /// Path used to invoke the tool
    pub program: PathBuf,
    pub present: bool,
    /// Parsed version, if the output contained one
    pub version: Option<Version>,
}

/// Minimum build tool version for a platform, if one is enforced.
pub fn minimum_version(os: OsFamily) -> Option<Version> {
    match os {
        OsFamily::Windows => Some(WINDOWS_MIN_CMAKE),
        OsFamily::Linux | OsFamily::MacOs => None,
    }
}

/// Parse the version out of `cmake --version` output.
///
/// Accepts `cmake version 3.20.5`, `cmake version 3.28.0-rc1` and short
/// forms such as `version 3.1`.
pub fn parse_cmake_version(output: &str) -> Option<Version> {
    let re = VERSION_RE.as_ref()?;
    let raw = re.captures(output)?.get(1)?.as_str();
    parse_version_flexible(raw)
}

/// Parse a dotted version string, padding missing components with zero.
pub fn parse_version_flexible(version_str: &str) -> Option<Version> {
    let clean = version_str.trim().trim_end_matches('.');

    if let Ok(v) = clean.parse() {
        return Some(v);
    }

    let parts: Vec<&str> = clean.split('.').collect();
    let major = parts.first().and_then(|s| s.parse().ok())?;
    let minor = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);
    let patch = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);

    Some(Version::new(major, minor, patch))
}

/// Probes the build tool through an [`Executor`].
pub struct Prober<'a> {
    executor: &'a dyn Executor,
    host: HostPlatform,
}

impl<'a> Prober<'a> {
    pub fn new(executor: &'a dyn Executor, host: HostPlatform) -> Self {
        Prober { executor, host }
    }

    /// Query `program --version` and enforce the platform minimum.
    pub fn probe(&self, program: &Path) -> Result<ToolchainInfo, BuildError> {
        let cmd = ProcessBuilder::new(program).arg("--version");

        let output = match self.executor.exec(&cmd) {
            Ok(output) => output,
            Err(e) => {
                let detail = format!("`{}` could not be executed: {}", cmd.display_command(), e);
                tracing::debug!("{}", detail);
                return Err(missing(program, Some(detail)));
            }
        };

        if !output.success() {
            let status = match output.code {
                Some(code) => format!("code {}", code),
                None => "no exit code".to_string(),
            };
            let mut detail = format!("`{}` exited with {}", cmd.display_command(), status);
            let combined = output.combined();
            if !combined.is_empty() {
                detail.push_str(": ");
                detail.push_str(&combined);
            }
            tracing::debug!("{}", detail);
            return Err(missing(program, Some(detail)));
        }

        let version = parse_cmake_version(&output.stdout);
        match version {
            Some(ref v) => tracing::debug!("found {} {}", CMAKE, v),
            None => tracing::warn!(
                "could not parse a version from `{}` output",
                cmd.display_command()
            ),
        }

        if let Some(required) = minimum_version(self.host.os) {
            // An unparseable version cannot be shown to meet the minimum.
            let found = version.clone().unwrap_or_else(|| Version::new(0, 0, 0));
            if found < required {
                return Err(BuildError::ToolchainTooOld {
                    tool: CMAKE.to_string(),
                    platform: self.host.os.to_string(),
                    required,
                    found,
                });
            }
        }

        Ok(ToolchainInfo {
            program: program.to_path_buf(),
            present: true,
            version,
        })
    }
}

fn missing(program: &Path, detail: Option<String>) -> BuildError {
    let tool = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| CMAKE.to_string());
    BuildError::ToolchainMissing { tool, detail }
}

/// Locate the build tool: an explicit path, or `cmake` on PATH.
pub fn locate_cmake(explicit: Option<&Path>) -> Result<PathBuf, BuildError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    find_cmake().ok_or_else(|| BuildError::ToolchainMissing {
        tool: CMAKE.to_string(),
        detail: None,
    })
}

/// Probe the build tool on the current host.
pub fn probe(executor: &dyn Executor, explicit: Option<&Path>) -> Result<ToolchainInfo, BuildError> {
    let program = locate_cmake(explicit)?;
    Prober::new(executor, HostPlatform::current()).probe(&program)
}

/// Whether an I/O error means the program itself is unusable.
pub fn is_missing_program(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    )
}
