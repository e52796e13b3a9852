//! Implementation of `anvil build` and `anvil plan`.
//!
//! One orchestration run probes the build tool, resolves the interpreter,
//! platform and accelerator inputs, prepares the build directories and then
//! drives CMake through configure and build.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::accelerator::{self, AcceleratorContext, SdkRoots};
use crate::builder::cache::{BuildCache, BuildConfiguration, BuildMode};
use crate::builder::cmake::{
    build_invocation, configure_invocation, BuildInvocation, CMakeDriver, DriverInputs,
    DriverState,
};
use crate::builder::errors::BuildError;
use crate::builder::interpreter::HostInterpreter;
use crate::builder::platform::{self, HostPlatform, PlatformArgs};
use crate::builder::toolchain::{self, locate_cmake, Prober, ToolchainInfo};
use crate::core::project::Project;
use crate::util::config::Config;
use crate::util::process::Executor;

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Override for the CMake source directory
    pub base_dir: Option<PathBuf>,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub configuration: BuildConfiguration,
    /// Directory the build tool wrote the native artifact to
    pub artifact_dir: PathBuf,
    pub history: Vec<DriverState>,
}

/// What a run would do, without doing it.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub mode: BuildMode,
    pub source_dir: PathBuf,
    pub toolchain: ToolchainInfo,
    pub interpreter_include: PathBuf,
    pub platform: PlatformArgs,
    pub accelerator: AcceleratorContext,
    pub configuration: BuildConfiguration,
    pub invocations: Vec<BuildInvocation>,
}

/// Inputs resolved after a successful probe.
struct ResolvedInputs {
    toolchain: ToolchainInfo,
    interpreter: HostInterpreter,
    platform: PlatformArgs,
    accelerator: AcceleratorContext,
}

/// Composes the builder components for one project.
pub struct Orchestrator<'a> {
    executor: &'a dyn Executor,
    config: Config,
    /// `None` means the current host.
    host: Option<HostPlatform>,
    /// `None` means the signal is read from the process environment.
    signal: Option<Option<String>>,
}

impl<'a> Orchestrator<'a> {
    /// An orchestrator for the current host and process environment.
    pub fn new(executor: &'a dyn Executor, config: Config) -> Self {
        Orchestrator {
            executor,
            config,
            host: None,
            signal: None,
        }
    }

    /// Override the host platform.
    pub fn with_host(mut self, host: HostPlatform) -> Self {
        self.host = Some(host);
        self
    }

    /// Override the accelerator signal.
    pub fn with_signal(mut self, signal: Option<String>) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn mode(&self) -> BuildMode {
        self.config.mode()
    }

    /// Directory allocation for `project`.
    pub fn cache(&self, project: &Project) -> BuildCache {
        build_cache(project, &self.config)
    }

    /// Probe the build tool. Nothing else runs if this fails.
    pub fn probe(&self) -> Result<ToolchainInfo, BuildError> {
        let explicit = self.config.toolchain.cmake.as_deref();
        match self.host {
            Some(host) => Prober::new(self.executor, host).probe(&locate_cmake(explicit)?),
            None => toolchain::probe(self.executor, explicit),
        }
    }

    fn resolve(&self) -> Result<ResolvedInputs, BuildError> {
        let toolchain = self.probe()?;

        let interpreter =
            HostInterpreter::detect(self.executor, self.config.python.executable.as_deref())?;

        let platform = match self.host {
            Some(ref host) => PlatformArgs::resolve(host, self.mode()),
            None => platform::resolve(self.mode()),
        };

        let roots = SdkRoots::new(
            self.config.accelerator.cuda_root.as_deref(),
            self.config.accelerator.rocm_root.as_deref(),
        );
        let accelerator = match self.signal {
            Some(ref signal) => {
                AcceleratorContext::resolve(signal.as_deref(), &roots, &interpreter.include_dir)
            }
            None => accelerator::locate(&roots, &interpreter.include_dir),
        };

        tracing::debug!(
            "resolved inputs: accelerator={} parallelism={}",
            accelerator.kind,
            platform.parallelism.native_arg()
        );

        Ok(ResolvedInputs {
            toolchain,
            interpreter,
            platform,
            accelerator,
        })
    }

    /// Compute both invocations without creating directories or running the
    /// build tool.
    pub fn plan(&self, project: &Project, options: &BuildOptions) -> Result<BuildPlan, BuildError> {
        let resolved = self.resolve()?;
        let source_dir = project.base_dir(options.base_dir.as_deref());
        let configuration = self.cache(project).configuration(self.mode());

        let inputs = DriverInputs {
            configuration: &configuration,
            toolchain: &resolved.toolchain,
            platform: &resolved.platform,
            accelerator: &resolved.accelerator,
        };
        let invocations = vec![
            configure_invocation(&source_dir, inputs),
            build_invocation(inputs),
        ];

        Ok(BuildPlan {
            mode: self.mode(),
            source_dir,
            interpreter_include: resolved.interpreter.include_dir,
            toolchain: resolved.toolchain,
            platform: resolved.platform,
            accelerator: resolved.accelerator,
            configuration,
            invocations,
        })
    }

    /// Run the full orchestration: probe, resolve, prepare, configure, build.
    pub fn run(&self, project: &Project, options: &BuildOptions) -> Result<BuildOutcome, BuildError> {
        let resolved = self.resolve()?;
        let configuration = self.cache(project).prepare(self.mode())?;
        let source_dir = project.base_dir(options.base_dir.as_deref());

        let mut driver = CMakeDriver::new(self.executor, source_dir);
        let artifact_dir = driver.run(DriverInputs {
            configuration: &configuration,
            toolchain: &resolved.toolchain,
            platform: &resolved.platform,
            accelerator: &resolved.accelerator,
        })?;

        Ok(BuildOutcome {
            configuration,
            artifact_dir,
            history: driver.history().to_vec(),
        })
    }
}

/// Directory allocation for `project` under `config`.
///
/// `build.build_temp` overrides the scratch directory (relative paths are
/// taken from the project root); `cache.root` overrides the system temp dir.
pub fn build_cache(project: &Project, config: &Config) -> BuildCache {
    let scratch = match config.build.build_temp {
        Some(ref dir) if dir.is_absolute() => dir.clone(),
        Some(ref dir) => project.root().join(dir),
        None => project.build_temp(),
    };
    let output = project.extension_output_dir();

    match config.cache.root {
        Some(ref root) => BuildCache::new(root.clone(), scratch, output),
        None => BuildCache::in_temp_dir(scratch, output),
    }
}

/// Build the native extension of `project` on the current host.
pub fn build(
    project: &Project,
    config: Config,
    executor: &dyn Executor,
    options: &BuildOptions,
) -> Result<BuildOutcome, BuildError> {
    Orchestrator::new(executor, config).run(project, options)
}

/// Plan the native extension build of `project` on the current host.
pub fn plan(
    project: &Project,
    config: Config,
    executor: &dyn Executor,
    options: &BuildOptions,
) -> Result<BuildPlan, BuildError> {
    Orchestrator::new(executor, config).plan(project, options)
}
