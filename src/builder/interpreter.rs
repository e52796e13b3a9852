//! Host interpreter header discovery.
//!
//! The native extension binds back into the interpreter that loads it, so the
//! interpreter's own include directory is always on the configure include
//! path.

use std::path::{Path, PathBuf};

use crate::builder::errors::BuildError;
use crate::util::process::{find_python, Executor, ProcessBuilder};

const INCLUDE_QUERY: &str = "import sysconfig; print(sysconfig.get_paths()['include'])";

/// The interpreter the extension is being built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInterpreter {
    pub executable: PathBuf,
    pub include_dir: PathBuf,
}

impl HostInterpreter {
    /// Resolve the interpreter (explicit path or `python3`/`python` on PATH)
    /// and ask it for its include directory.
    pub fn detect(executor: &dyn Executor, explicit: Option<&Path>) -> Result<Self, BuildError> {
        let executable = match explicit {
            Some(path) => path.to_path_buf(),
            None => find_python().ok_or_else(|| BuildError::InterpreterMissing {
                reason: "neither `python3` nor `python` was found in PATH".to_string(),
            })?,
        };

        Self::query(executor, executable)
    }

    /// Ask a known interpreter for its include directory.
    pub fn query(executor: &dyn Executor, executable: PathBuf) -> Result<Self, BuildError> {
        let cmd = ProcessBuilder::new(&executable).args(["-c", INCLUDE_QUERY]);

        let output = executor
            .exec(&cmd)
            .map_err(|e| BuildError::InterpreterMissing {
                reason: format!("failed to run `{}`: {}", executable.display(), e),
            })?;

        if !output.success() {
            return Err(BuildError::InterpreterMissing {
                reason: format!(
                    "`{}` exited with {:?}: {}",
                    cmd.display_command(),
                    output.code,
                    output.combined()
                ),
            });
        }

        let include = output.stdout.lines().map(str::trim).find(|l| !l.is_empty());
        let Some(include) = include else {
            return Err(BuildError::InterpreterMissing {
                reason: format!("`{}` printed no include directory", executable.display()),
            });
        };

        tracing::debug!("interpreter include directory: {}", include);

        Ok(HostInterpreter {
            executable,
            include_dir: PathBuf::from(include),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::errors::ErrorKind;
    use crate::test_support::{MockExecutor, MockProcessOutput};

    #[test]
    fn test_query_reads_include_dir() {
        let exec = MockExecutor::new();
        exec.expect_prefix(
            "/usr/bin/python3 -c",
            MockProcessOutput::success("/usr/include/python3.11\n"),
        );

        let interp = HostInterpreter::query(&exec, PathBuf::from("/usr/bin/python3")).unwrap();
        assert_eq!(interp.include_dir, PathBuf::from("/usr/include/python3.11"));
    }

    #[test]
    fn test_query_failure_is_interpreter_missing() {
        let exec = MockExecutor::new();
        exec.expect_prefix(
            "python -c",
            MockProcessOutput::failure(1, "ModuleNotFoundError: No module named 'sysconfig'"),
        );

        let err = HostInterpreter::query(&exec, PathBuf::from("python")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InterpreterMissing);
        assert!(err.to_string().contains("ModuleNotFoundError"));
    }

    #[test]
    fn test_query_empty_output() {
        let exec = MockExecutor::new();
        exec.expect_prefix("python -c", MockProcessOutput::success("\n"));

        let err = HostInterpreter::query(&exec, PathBuf::from("python")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InterpreterMissing);
    }
}
