//! Native extension build pipeline.
//!
//! This module implements the pieces of one orchestration run: probing the
//! build tool, resolving platform arguments and accelerator include paths,
//! allocating the build directories, and driving the configure and build
//! phases.

pub mod accelerator;
pub mod cache;
pub mod cmake;
pub mod errors;
pub mod interpreter;
pub mod platform;
pub mod toolchain;

pub use accelerator::{AcceleratorContext, AcceleratorKind, SdkRoots};
pub use cache::{BuildCache, BuildConfiguration, BuildMode};
pub use cmake::{BuildInvocation, CMakeDriver, DriverInputs, DriverState, Phase};
pub use errors::{BuildError, ErrorKind};
pub use interpreter::HostInterpreter;
pub use platform::{HostPlatform, OsFamily, Parallelism, PlatformArgs};
pub use toolchain::{Prober, ToolchainInfo};
