//! Accelerator SDK include path resolution.
//!
//! The active backend is read from a single environment signal. A ROCm signal
//! selects the ROCm SDK headers; anything else, including no signal at all,
//! selects the CUDA SDK headers. No existence check happens here: a wrong
//! include path is reported by the configure phase, which validates include
//! paths itself.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Environment variable naming the tensor library's accelerator backend.
pub const ACCELERATOR_ENV: &str = "ANVIL_GPU_BACKEND";

/// Default CUDA toolkit root.
pub const DEFAULT_CUDA_ROOT: &str = "/usr/local/cuda";

/// Default ROCm root.
pub const DEFAULT_ROCM_ROOT: &str = "/opt/rocm";

/// Accelerator family the extension is built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceleratorKind {
    Cuda,
    Rocm,
    /// No recognised signal; CUDA headers are used by default.
    None,
}

impl AcceleratorKind {
    /// Interpret the signal value. Unknown or empty values map to `None`.
    pub fn from_signal(signal: Option<&str>) -> Self {
        let Some(value) = signal.map(str::trim).filter(|v| !v.is_empty()) else {
            return AcceleratorKind::None;
        };

        match value.to_ascii_lowercase().as_str() {
            "rocm" | "hip" | "amd" => AcceleratorKind::Rocm,
            "cuda" | "nvidia" => AcceleratorKind::Cuda,
            _ => AcceleratorKind::None,
        }
    }
}

impl fmt::Display for AcceleratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceleratorKind::Cuda => write!(f, "cuda"),
            AcceleratorKind::Rocm => write!(f, "rocm"),
            AcceleratorKind::None => write!(f, "none"),
        }
    }
}

/// SDK installation roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkRoots {
    pub cuda: PathBuf,
    pub rocm: PathBuf,
}

impl SdkRoots {
    /// Roots with optional overrides, falling back to the canonical locations.
    pub fn new(cuda: Option<&Path>, rocm: Option<&Path>) -> Self {
        SdkRoots {
            cuda: cuda
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CUDA_ROOT)),
            rocm: rocm
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ROCM_ROOT)),
        }
    }
}

impl Default for SdkRoots {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Resolved accelerator family and ordered include search path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceleratorContext {
    pub kind: AcceleratorKind,
    pub include_paths: Vec<PathBuf>,
}

impl AcceleratorContext {
    /// Resolve from an explicit signal value. Deterministic.
    ///
    /// The SDK include directory comes first; the interpreter include
    /// directory is always appended last.
    pub fn resolve(signal: Option<&str>, roots: &SdkRoots, interpreter_include: &Path) -> Self {
        let kind = AcceleratorKind::from_signal(signal);

        let sdk_include = match kind {
            AcceleratorKind::Rocm => roots.rocm.join("include"),
            AcceleratorKind::Cuda => roots.cuda.join("include"),
            AcceleratorKind::None => {
                match signal {
                    Some(value) => tracing::warn!(
                        "unrecognised {}={:?}; defaulting to CUDA headers",
                        ACCELERATOR_ENV,
                        value
                    ),
                    None => tracing::warn!(
                        "{} is not set; defaulting to CUDA headers",
                        ACCELERATOR_ENV
                    ),
                }
                roots.cuda.join("include")
            }
        };

        AcceleratorContext {
            kind,
            include_paths: vec![sdk_include, interpreter_include.to_path_buf()],
        }
    }

    /// The SDK include directory (everything but the interpreter entry).
    pub fn sdk_include(&self) -> Option<&Path> {
        self.include_paths.first().map(PathBuf::as_path)
    }

    /// The include list as a CMake list value.
    pub fn joined(&self) -> String {
        join_paths(&self.include_paths)
    }
}

/// Join paths with `;`, the CMake list separator, on every platform.
pub fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Read the accelerator signal from the process environment.
pub fn signal_from_env() -> Option<String> {
    std::env::var(ACCELERATOR_ENV).ok()
}

/// Resolve the accelerator context from the process environment.
pub fn locate(roots: &SdkRoots, interpreter_include: &Path) -> AcceleratorContext {
    let signal = signal_from_env();
    AcceleratorContext::resolve(signal.as_deref(), roots, interpreter_include)
}
