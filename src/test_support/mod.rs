//! Test utilities and mocks for Anvil unit tests.
//!
//! [`MockExecutor`] stands in for the build tool and the interpreter so the
//! orchestrator can be exercised without CMake, Python or a GPU SDK installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use anvil::test_support::{MockExecutor, MockProcessOutput};
//!
//! let exec = MockExecutor::new();
//! exec.expect_prefix("cmake --version", MockProcessOutput::success("cmake version 3.27.0"));
//! exec.expect_prefix("cmake --build", MockProcessOutput::failure(2, "link error"));
//! ```

pub mod fixtures;

use std::io;
use std::sync::Mutex;

use crate::util::process::{Executor, ProcessBuilder, ProcessOutput};

pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Create an output with both stdout and stderr.
    pub fn with_output(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    fn to_output(&self) -> ProcessOutput {
        ProcessOutput {
            code: Some(self.status),
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

/// Pattern for matching commands in MockExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
        }
    }
}

/// What a matched command produces.
#[derive(Debug, Clone)]
enum MockResponse {
    Output(MockProcessOutput),
    SpawnError(io::ErrorKind),
}

#[derive(Debug, Clone)]
struct CommandExpectation {
    pattern: CommandPattern,
    response: MockResponse,
}

#[derive(Debug, Default)]
struct MockState {
    expectations: Vec<CommandExpectation>,
    calls: Vec<String>,
    cwds: Vec<Option<String>>,
}

/// Mock process executor for testing command execution.
///
/// Expectations are checked in registration order; the first match wins.
/// Unmatched commands fail to spawn with `NotFound`.
#[derive(Debug, Default)]
pub struct MockExecutor {
    state: Mutex<MockState>,
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        MockExecutor::default()
    }

    fn push(&self, pattern: CommandPattern, response: MockResponse) -> &Self {
        self.state
            .lock()
            .unwrap()
            .expectations
            .push(CommandExpectation { pattern, response });
        self
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&self, cmd: &str, output: MockProcessOutput) -> &Self {
        self.push(CommandPattern::Exact(cmd.to_string()), MockResponse::Output(output))
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&self, prefix: &str, output: MockProcessOutput) -> &Self {
        self.push(
            CommandPattern::StartsWith(prefix.to_string()),
            MockResponse::Output(output),
        )
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&self, substring: &str, output: MockProcessOutput) -> &Self {
        self.push(
            CommandPattern::Contains(substring.to_string()),
            MockResponse::Output(output),
        )
    }

    /// Make commands starting with `prefix` fail to spawn.
    pub fn expect_spawn_error(&self, prefix: &str, kind: io::ErrorKind) -> &Self {
        self.push(
            CommandPattern::StartsWith(prefix.to_string()),
            MockResponse::SpawnError(kind),
        )
    }

    /// Get all commands that were called.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Working directories of every call, in order.
    pub fn cwds(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().cwds.clone()
    }

    /// Whether any call contained `needle`.
    pub fn was_called(&self, needle: &str) -> bool {
        self.calls().iter().any(|c| c.contains(needle))
    }
}

impl Executor for MockExecutor {
    fn exec(&self, cmd: &ProcessBuilder) -> io::Result<ProcessOutput> {
        let full_cmd = cmd.display_command();
        let mut state = self.state.lock().unwrap();

        state.calls.push(full_cmd.clone());
        state
            .cwds
            .push(cmd.get_cwd().map(|p| p.display().to_string()));

        let response = state
            .expectations
            .iter()
            .find(|exp| exp.pattern.matches(&full_cmd))
            .map(|exp| exp.response.clone());

        match response {
            Some(MockResponse::Output(output)) => Ok(output.to_output()),
            Some(MockResponse::SpawnError(kind)) => Err(io::Error::new(kind, "mock spawn error")),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("unexpected command: {}", full_cmd),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_executor_first_match_wins() {
        let exec = MockExecutor::new();
        exec.expect_prefix("cmake --build", MockProcessOutput::failure(2, "boom"));
        exec.expect_prefix("cmake", MockProcessOutput::success("ok"));

        let out = exec
            .exec(&ProcessBuilder::new("cmake").args(["--build", "."]))
            .unwrap();
        assert_eq!(out.code, Some(2));

        let out = exec.exec(&ProcessBuilder::new("cmake").arg("/src")).unwrap();
        assert!(out.success());

        assert_eq!(exec.calls(), vec!["cmake --build .", "cmake /src"]);
    }

    #[test]
    fn test_mock_executor_unexpected_command() {
        let exec = MockExecutor::new();
        let err = exec.exec(&ProcessBuilder::new("ninja")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(exec.was_called("ninja"));
    }
}
