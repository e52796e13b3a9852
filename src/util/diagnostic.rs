//! User-friendly diagnostic messages.
//!
//! Every build failure is rendered with the failing phase, the exact command
//! that was attempted and the native tool's output, followed by suggested
//! fixes.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no manifest file is found.
    pub const NO_MANIFEST: &str = "Run anvil from a directory containing Anvil.toml";

    /// Suggestion when the build tool is missing.
    pub const INSTALL_CMAKE: &str = "Install CMake and ensure it is in your PATH";

    /// Suggestion when the build tool is too old.
    pub const UPGRADE_CMAKE: &str = "Upgrade CMake to a newer release";

    /// Suggestion when the build tool path is configured explicitly.
    pub const CONFIGURE_CMAKE: &str = "Set `toolchain.cmake` in .anvil/config.toml";

    /// Suggestion when the interpreter cannot be found.
    pub const CONFIGURE_PYTHON: &str = "Set `python.executable` in .anvil/config.toml";

    /// Suggestion when configure fails on include paths.
    pub const CHECK_ACCELERATOR: &str =
        "Check that ANVIL_GPU_BACKEND matches the installed SDK (cuda or rocm)";

    /// Suggestion when the SDK lives in a non-default location.
    pub const CONFIGURE_SDK_ROOT: &str =
        "Set `accelerator.cuda_root` or `accelerator.rocm_root` in .anvil/config.toml";

    /// Suggestion for a general environment check.
    pub const RUN_DOCTOR: &str = "Run `anvil doctor` to check the build environment";

    /// Suggestion when the build phase fails.
    pub const VERBOSE_BUILD: &str = "Re-run with `anvil --verbose build` for more details";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Verbatim output block (tool stdout/stderr)
    pub output: Option<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            output: None,
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attach captured tool output, printed unmodified.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (color, self.severity) {
            (true, Severity::Error) => "\x1b[1;31merror\x1b[0m",
            (true, Severity::Warning) => "\x1b[1;33mwarning\x1b[0m",
            (false, Severity::Error) => "error",
            (false, Severity::Warning) => "warning",
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if let Some(ref tool_output) = self.output {
            if !tool_output.is_empty() {
                output.push('\n');
                output.push_str(tool_output);
                if !tool_output.ends_with('\n') {
                    output.push('\n');
                }
            }
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}
