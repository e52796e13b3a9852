//! Host platform detection and per-platform build tool arguments.
//!
//! All platform-conditional shaping lives in [`POLICIES`]: one row per OS
//! family. Supporting another family means adding a row, not another branch
//! in the driver.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::Serialize;

use crate::builder::cache::BuildMode;

/// Parallelism used when the host core count cannot be determined.
pub const FALLBACK_JOBS: usize = 8;

/// Operating system family of the build host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Windows,
    Linux,
    MacOs,
}

impl OsFamily {
    /// Family of the platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else {
            OsFamily::Linux
        }
    }

    pub fn is_windows(self) -> bool {
        self == OsFamily::Windows
    }

    /// Short name used in directory names.
    pub fn as_str(self) -> &'static str {
        match self {
            OsFamily::Windows => "windows",
            OsFamily::Linux => "linux",
            OsFamily::MacOs => "macos",
        }
    }

    /// File extensions the host interpreter loads native extensions from.
    pub fn extension_suffixes(self) -> &'static [&'static str] {
        match self {
            OsFamily::Windows => &["pyd", "dll"],
            OsFamily::Linux => &["so"],
            OsFamily::MacOs => &["so", "dylib"],
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts about the build host that argument shaping depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostPlatform {
    pub os: OsFamily,
    pub pointer_width: u32,
    pub available_cores: Option<NonZeroUsize>,
}

impl HostPlatform {
    /// Describe the current host.
    pub fn current() -> Self {
        HostPlatform {
            os: OsFamily::current(),
            pointer_width: usize::BITS,
            available_cores: std::thread::available_parallelism().ok(),
        }
    }

    /// A host with explicit values.
    pub fn new(os: OsFamily, pointer_width: u32, available_cores: Option<usize>) -> Self {
        HostPlatform {
            os,
            pointer_width,
            available_cores: available_cores.and_then(NonZeroUsize::new),
        }
    }

    /// `<os>-<arch>` tag used to name build directories.
    pub fn tag(&self) -> String {
        format!("{}-{}", self.os, std::env::consts::ARCH)
    }
}

/// How the per-platform policy derives build parallelism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobsPolicy {
    /// Hand parallelism to the native tool's own multi-process switch.
    ToolDefault,
    /// Run `factor` jobs per available core.
    PerCore { factor: usize },
}

/// One row of the platform table.
#[derive(Debug, Clone, Copy)]
struct PlatformPolicy {
    family: OsFamily,
    per_config_output: bool,
    jobs: JobsPolicy,
    select_arch: bool,
}

const POSIX_JOBS: JobsPolicy = JobsPolicy::PerCore { factor: 2 };

const POLICIES: &[PlatformPolicy] = &[
    PlatformPolicy {
        family: OsFamily::Windows,
        per_config_output: true,
        jobs: JobsPolicy::ToolDefault,
        select_arch: true,
    },
    PlatformPolicy {
        family: OsFamily::Linux,
        per_config_output: false,
        jobs: POSIX_JOBS,
        select_arch: false,
    },
    PlatformPolicy {
        family: OsFamily::MacOs,
        per_config_output: false,
        jobs: POSIX_JOBS,
        select_arch: false,
    },
];

fn policy(family: OsFamily) -> &'static PlatformPolicy {
    POLICIES
        .iter()
        .find(|p| p.family == family)
        .unwrap_or(&POLICIES[1])
}

/// A configure-phase flag whose rendering depends on the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "mode", rename_all = "kebab-case")]
pub enum GeneratorFlag {
    /// `-DCMAKE_BUILD_TYPE=<Mode>` for single-config generators.
    BuildType(BuildMode),
    /// `-DCMAKE_LIBRARY_OUTPUT_DIRECTORY_<MODE>=<dir>` for multi-config generators.
    PerConfigOutput(BuildMode),
}

impl GeneratorFlag {
    /// Render the flag for the given extension output directory.
    pub fn render(&self, output_dir: &Path) -> String {
        match self {
            GeneratorFlag::BuildType(mode) => format!("-DCMAKE_BUILD_TYPE={}", mode),
            GeneratorFlag::PerConfigOutput(mode) => format!(
                "-DCMAKE_LIBRARY_OUTPUT_DIRECTORY_{}={}",
                mode.as_str().to_uppercase(),
                output_dir.display()
            ),
        }
    }
}

/// Parallelism handed to the native build tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Parallelism {
    /// The tool's own multi-process switch (`/m`).
    ToolDefault,
    /// An explicit job count (`-j<n>`).
    Jobs(NonZeroUsize),
}

impl Parallelism {
    /// The native tool argument passed after `--`.
    pub fn native_arg(&self) -> String {
        match self {
            Parallelism::ToolDefault => "/m".to_string(),
            Parallelism::Jobs(n) => format!("-j{}", n),
        }
    }
}

/// Platform-derived build tool arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformArgs {
    pub generator_flags: Vec<GeneratorFlag>,
    pub parallelism: Parallelism,
    pub architecture_flag: Option<String>,
}

impl PlatformArgs {
    /// Derive arguments for `host` in `mode`. Pure: no global state is read.
    pub fn resolve(host: &HostPlatform, mode: BuildMode) -> Self {
        let policy = policy(host.os);

        let generator_flags = if policy.per_config_output {
            vec![GeneratorFlag::PerConfigOutput(mode)]
        } else {
            vec![GeneratorFlag::BuildType(mode)]
        };

        let parallelism = match policy.jobs {
            JobsPolicy::ToolDefault => Parallelism::ToolDefault,
            JobsPolicy::PerCore { factor } => {
                let jobs = host
                    .available_cores
                    .map(|n| n.get().saturating_mul(factor))
                    .unwrap_or(FALLBACK_JOBS);
                Parallelism::Jobs(NonZeroUsize::new(jobs).unwrap_or(NonZeroUsize::MIN))
            }
        };

        let architecture_flag =
            (policy.select_arch && host.pointer_width > 32).then(|| "x64".to_string());

        PlatformArgs {
            generator_flags,
            parallelism,
            architecture_flag,
        }
    }

    /// Configure-phase arguments contributed by the platform.
    pub fn configure_args(&self, output_dir: &Path) -> Vec<String> {
        let mut args: Vec<String> = self
            .generator_flags
            .iter()
            .map(|flag| flag.render(output_dir))
            .collect();

        if let Some(ref arch) = self.architecture_flag {
            args.push("-A".to_string());
            args.push(arch.clone());
        }

        args
    }
}

/// Resolve platform arguments for the current host.
pub fn resolve(mode: BuildMode) -> PlatformArgs {
    PlatformArgs::resolve(&HostPlatform::current(), mode)
}
