//! Subprocess execution utilities.
//!
//! Every external tool the orchestrator touches (the build tool, the host
//! interpreter) goes through [`Executor`], which returns the exit status and
//! the captured output in one value. Tests swap in a mock executor.

use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the working directory, if one was set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Exit status and captured output of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the child exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr, for diagnostics.
    pub fn combined(&self) -> String {
        match (self.stdout.trim_end().is_empty(), self.stderr.trim_end().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Runs a [`ProcessBuilder`] to completion.
///
/// An `Err` means the child could not be spawned at all; a non-zero exit is
/// reported through [`ProcessOutput::code`].
pub trait Executor {
    fn exec(&self, cmd: &ProcessBuilder) -> io::Result<ProcessOutput>;
}

/// Executor backed by real child processes.
///
/// The child inherits this process's environment. Output is always captured;
/// with `echo` enabled each line is also forwarded to the terminal as it
/// arrives.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor {
    echo: bool,
}

impl SystemExecutor {
    /// Executor that only captures output.
    pub fn new() -> Self {
        SystemExecutor { echo: false }
    }

    /// Executor that captures output and forwards it live.
    pub fn echoing() -> Self {
        SystemExecutor { echo: true }
    }
}

impl Executor for SystemExecutor {
    fn exec(&self, cmd: &ProcessBuilder) -> io::Result<ProcessOutput> {
        let mut command = cmd.build_command();
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        tracing::debug!("running `{}`", cmd.display_command());

        let mut child = command.spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let echo = self.echo;

        let out_handle = thread::spawn(move || collect(stdout, echo.then(io::stdout)));
        let err_handle = thread::spawn(move || collect(stderr, echo.then(io::stderr)));

        let status = child.wait()?;
        let stdout = out_handle
            .join()
            .map_err(|_| io::Error::other("stdout reader panicked"))??;
        let stderr = err_handle
            .join()
            .map_err(|_| io::Error::other("stderr reader panicked"))??;

        Ok(ProcessOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Drain a child pipe into a string, optionally teeing each line.
fn collect<R: Read, W: Write>(pipe: Option<R>, mut tee: Option<W>) -> io::Result<String> {
    let mut captured = String::new();
    let Some(pipe) = pipe else {
        return Ok(captured);
    };

    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if let Some(ref mut w) = tee {
            w.write_all(&buf)?;
            w.flush()?;
        }
        captured.push_str(&String::from_utf8_lossy(&buf));
    }

    Ok(captured)
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find CMake.
pub fn find_cmake() -> Option<PathBuf> {
    find_executable("cmake")
}

/// Find a Python interpreter, preferring `python3`.
pub fn find_python() -> Option<PathBuf> {
    find_executable("python3").or_else(|| find_executable("python"))
}
