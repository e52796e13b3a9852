//! Anvil - a native extension build orchestrator
//!
//! This crate provides the core library functionality for Anvil: probing the
//! build tool, resolving platform and accelerator inputs, driving CMake
//! through configure and build, and assembling the installable package.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for Anvil unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a mock process executor and sample project fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::builder::{BuildError, ErrorKind};
pub use crate::core::{Manifest, Project};
pub use util::context::GlobalContext;
