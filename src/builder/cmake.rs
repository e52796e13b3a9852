//! CMake configure-and-build driver for the native extension.
//!
//! A run is two blocking invocations of the build tool from the scratch
//! directory: configure, then build. Neither phase is retried; a failure
//! carries the attempted command line and the tool's captured output.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::accelerator::AcceleratorContext;
use crate::builder::cache::BuildConfiguration;
use crate::builder::errors::BuildError;
use crate::builder::platform::PlatformArgs;
use crate::builder::toolchain::{is_missing_program, ToolchainInfo, CMAKE};
use crate::util::process::{Executor, ProcessBuilder};

/// Disables the tutorial sub-builds.
pub const TUTORIALS_FLAG: &str = "-DBUILD_TUTORIALS=OFF";

/// Enables the interpreter binding sub-build.
pub const BINDING_FLAG: &str = "-DBUILD_PYTHON_MODULE=ON";

/// Cache variable pointing the sub-build at its persistent directory.
pub const SUBBUILD_DIR_VAR: &str = "TRITON_LLVM_BUILD_DIR";

/// Cache variable receiving the include search path.
pub const INCLUDE_DIRS_VAR: &str = "PYTHON_INCLUDE_DIRS";

/// A native build tool phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Configure,
    Build,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Configure => write!(f, "configure"),
            Phase::Build => write!(f, "build"),
        }
    }
}

/// Progress of a driver through one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DriverState {
    NotStarted,
    Configuring,
    ConfigureFailed,
    Building,
    BuildFailed,
    Complete,
}

impl DriverState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: DriverState) -> bool {
        use DriverState::*;
        matches!(
            (self, next),
            (NotStarted, Configuring)
                | (Configuring, ConfigureFailed)
                | (Configuring, Building)
                | (Building, BuildFailed)
                | (Building, Complete)
        )
    }

    /// Whether the run has ended, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DriverState::ConfigureFailed | DriverState::BuildFailed | DriverState::Complete
        )
    }
}

/// Environment handed to a build tool child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvPolicy {
    /// The orchestrator's environment, unmodified. User-set toolchain
    /// variables (CC, CXX, CUDA paths) reach the build tool.
    #[default]
    Inherited,
}

/// One fully-specified invocation of the build tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInvocation {
    pub phase: Phase,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: EnvPolicy,
}

impl BuildInvocation {
    /// The command line as it would be typed.
    pub fn display_command(&self) -> String {
        self.to_process().display_command()
    }

    fn to_process(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
            .args(&self.args)
            .cwd(&self.cwd)
    }
}

/// Everything a driver run consumes.
#[derive(Debug, Clone, Copy)]
pub struct DriverInputs<'a> {
    pub configuration: &'a BuildConfiguration,
    pub toolchain: &'a ToolchainInfo,
    pub platform: &'a PlatformArgs,
    pub accelerator: &'a AcceleratorContext,
}

/// Assemble the configure-phase invocation.
pub fn configure_invocation(source_dir: &Path, inputs: DriverInputs<'_>) -> BuildInvocation {
    let config = inputs.configuration;

    let mut args = vec![
        source_dir.display().to_string(),
        format!("-DCMAKE_LIBRARY_OUTPUT_DIRECTORY={}", config.output_dir.display()),
        TUTORIALS_FLAG.to_string(),
        BINDING_FLAG.to_string(),
        format!("-D{}={}", SUBBUILD_DIR_VAR, config.cache_dir.display()),
        format!("-D{}={}", INCLUDE_DIRS_VAR, inputs.accelerator.joined()),
    ];
    args.extend(inputs.platform.configure_args(&config.output_dir));

    BuildInvocation {
        phase: Phase::Configure,
        program: inputs.toolchain.program.clone(),
        args,
        cwd: config.scratch_dir.clone(),
        env: EnvPolicy::Inherited,
    }
}

/// Assemble the build-phase invocation.
pub fn build_invocation(inputs: DriverInputs<'_>) -> BuildInvocation {
    let config = inputs.configuration;

    let args = vec![
        "--build".to_string(),
        ".".to_string(),
        "--config".to_string(),
        config.mode.to_string(),
        "--".to_string(),
        inputs.platform.parallelism.native_arg(),
    ];

    BuildInvocation {
        phase: Phase::Build,
        program: inputs.toolchain.program.clone(),
        args,
        cwd: config.scratch_dir.clone(),
        env: EnvPolicy::Inherited,
    }
}

/// Drives one configure-and-build run.
pub struct CMakeDriver<'a> {
    executor: &'a dyn Executor,
    source_dir: PathBuf,
    state: DriverState,
    history: Vec<DriverState>,
}

impl<'a> CMakeDriver<'a> {
    /// A driver for the CMake project in `source_dir`.
    pub fn new(executor: &'a dyn Executor, source_dir: PathBuf) -> Self {
        CMakeDriver {
            executor,
            source_dir,
            state: DriverState::NotStarted,
            history: vec![DriverState::NotStarted],
        }
    }

    /// Current state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Every state entered, in order, starting with `NotStarted`.
    pub fn history(&self) -> &[DriverState] {
        &self.history
    }

    fn transition(&mut self, next: DriverState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal driver transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!("driver {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    /// Configure, then build. Returns the directory the artifact is written to.
    ///
    /// The artifact itself is not checked for; that is the packaging step's job.
    pub fn run(&mut self, inputs: DriverInputs<'_>) -> Result<PathBuf, BuildError> {
        if self.state != DriverState::NotStarted {
            // A driver is single-use; a fresh run needs a fresh driver.
            *self = CMakeDriver::new(self.executor, self.source_dir.clone());
        }

        self.transition(DriverState::Configuring);
        let configure = configure_invocation(&self.source_dir, inputs);
        eprintln!("{:>12} {}", "Configuring", self.source_dir.display());
        if let Err(e) = self.execute(&configure) {
            self.transition(DriverState::ConfigureFailed);
            return Err(e);
        }

        self.transition(DriverState::Building);
        let build = build_invocation(inputs);
        eprintln!(
            "{:>12} native extension ({}, {})",
            "Building",
            inputs.configuration.mode,
            inputs.platform.parallelism.native_arg()
        );
        if let Err(e) = self.execute(&build) {
            self.transition(DriverState::BuildFailed);
            return Err(e);
        }

        self.transition(DriverState::Complete);
        Ok(inputs.configuration.output_dir.clone())
    }

    fn execute(&self, invocation: &BuildInvocation) -> Result<(), BuildError> {
        let command = invocation.display_command();
        tracing::info!("{} phase: {}", invocation.phase, command);

        let output = match self.executor.exec(&invocation.to_process()) {
            Ok(output) => output,
            Err(e) if is_missing_program(&e) => {
                return Err(BuildError::ToolchainMissing {
                    tool: CMAKE.to_string(),
                    detail: Some(format!("`{}` could not be started: {}", command, e)),
                });
            }
            Err(e) => {
                return Err(BuildError::phase_failed(
                    invocation.phase,
                    command,
                    None,
                    e.to_string(),
                ));
            }
        };

        if !output.success() {
            return Err(BuildError::phase_failed(
                invocation.phase,
                command,
                output.code,
                output.combined(),
            ));
        }

        Ok(())
    }
}
