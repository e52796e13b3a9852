//! Orchestration error types and diagnostics.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::builder::cmake::Phase;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// The closed set of ways an orchestration run can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ToolchainMissing,
    ToolchainTooOld,
    InterpreterMissing,
    DirectoryCreationFailed,
    ConfigureFailed,
    BuildFailed,
}

/// Error raised by an orchestration run. Every variant is fatal.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BuildError {
    #[error("`{tool}` must be installed to build the native extension")]
    #[diagnostic(
        code(anvil::toolchain::missing),
        help("Install CMake and ensure it is in your PATH")
    )]
    ToolchainMissing {
        tool: String,
        /// Why the tool was rejected, when it was found but did not run
        detail: Option<String>,
    },

    #[error("`{tool}` >= {required} is required on {platform}, found {found}")]
    #[diagnostic(code(anvil::toolchain::too_old), help("Upgrade CMake"))]
    ToolchainTooOld {
        tool: String,
        platform: String,
        required: semver::Version,
        found: semver::Version,
    },

    #[error("host interpreter unavailable: {reason}")]
    #[diagnostic(
        code(anvil::interpreter::missing),
        help("Set `python.executable` in .anvil/config.toml")
    )]
    InterpreterMissing { reason: String },

    #[error("failed to create directory `{}`", .path.display())]
    #[diagnostic(code(anvil::fs::create_dir))]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configure phase failed ({})\n  command: {command}\n\n{output}", describe_status(.status))]
    #[diagnostic(
        code(anvil::cmake::configure),
        help("Check that the accelerator SDK and interpreter include paths exist")
    )]
    ConfigureFailed {
        command: String,
        status: Option<i32>,
        output: String,
    },

    #[error("build phase failed ({})\n  command: {command}\n\n{output}", describe_status(.status))]
    #[diagnostic(
        code(anvil::cmake::build),
        help("Inspect the compiler output above")
    )]
    BuildFailed {
        command: String,
        status: Option<i32>,
        output: String,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

impl BuildError {
    /// The taxonomy entry for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::ToolchainMissing { .. } => ErrorKind::ToolchainMissing,
            BuildError::ToolchainTooOld { .. } => ErrorKind::ToolchainTooOld,
            BuildError::InterpreterMissing { .. } => ErrorKind::InterpreterMissing,
            BuildError::DirectoryCreationFailed { .. } => ErrorKind::DirectoryCreationFailed,
            BuildError::ConfigureFailed { .. } => ErrorKind::ConfigureFailed,
            BuildError::BuildFailed { .. } => ErrorKind::BuildFailed,
        }
    }

    /// Construct the failure for a native phase.
    pub fn phase_failed(phase: Phase, command: String, status: Option<i32>, output: String) -> Self {
        match phase {
            Phase::Configure => BuildError::ConfigureFailed {
                command,
                status,
                output,
            },
            Phase::Build => BuildError::BuildFailed {
                command,
                status,
                output,
            },
        }
    }

    /// Captured native tool output, for phase failures.
    pub fn output(&self) -> Option<&str> {
        match self {
            BuildError::ConfigureFailed { output, .. } | BuildError::BuildFailed { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }

    /// Convert to a user-friendly diagnostic.
    ///
    /// `output_echoed` is set when the tool's output already went to the
    /// terminal live; it is then not repeated.
    pub fn to_diagnostic(&self, output_echoed: bool) -> Diagnostic {
        let attach = |diag: Diagnostic, output: &str| {
            if output_echoed {
                diag.with_context("tool output: shown above")
            } else {
                diag.with_output(output.to_string())
            }
        };

        match self {
            BuildError::ToolchainMissing { tool, detail } => {
                let mut diag = Diagnostic::error(format!("`{}` not found", tool))
                    .with_context("the native extension is built with CMake");
                if let Some(detail) = detail {
                    diag = diag.with_context(detail.clone());
                }
                diag.with_suggestion(suggestions::INSTALL_CMAKE)
                    .with_suggestion(suggestions::CONFIGURE_CMAKE)
            }

            BuildError::ToolchainTooOld {
                tool,
                platform,
                required,
                found,
            } => Diagnostic::error(format!("`{}` is too old", tool))
                .with_context(format!("required: >= {} on {}", required, platform))
                .with_context(format!("found: {}", found))
                .with_suggestion(suggestions::UPGRADE_CMAKE),

            BuildError::InterpreterMissing { reason } => {
                Diagnostic::error("cannot resolve the host interpreter include directory")
                    .with_context(reason.clone())
                    .with_suggestion(suggestions::CONFIGURE_PYTHON)
            }

            BuildError::DirectoryCreationFailed { path, source } => {
                Diagnostic::error("failed to create build directory")
                    .with_location(path)
                    .with_context(source.to_string())
            }

            BuildError::ConfigureFailed {
                command,
                status,
                output,
            } => attach(
                Diagnostic::error("configure phase failed")
                    .with_context(format!("phase: {}", Phase::Configure))
                    .with_context(format!("status: {}", describe_status(status)))
                    .with_context(format!("command: {}", command)),
                output.as_str(),
            )
            .with_suggestion(suggestions::CHECK_ACCELERATOR)
            .with_suggestion(suggestions::CONFIGURE_SDK_ROOT)
            .with_suggestion(suggestions::RUN_DOCTOR),

            BuildError::BuildFailed {
                command,
                status,
                output,
            } => attach(
                Diagnostic::error("build phase failed")
                    .with_context(format!("phase: {}", Phase::Build))
                    .with_context(format!("status: {}", describe_status(status)))
                    .with_context(format!("command: {}", command)),
                output.as_str(),
            )
            .with_suggestion(suggestions::VERBOSE_BUILD),
        }
    }
}
