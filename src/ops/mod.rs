//! High-level operations.
//!
//! This module contains the implementation of Anvil commands.

pub mod assemble;
pub mod clean;
pub mod doctor;
pub mod ext_build;

pub use assemble::{assemble, AssembledPackage};
pub use clean::{clean, CleanOptions};
pub use doctor::{doctor, format_report, DoctorReport};
pub use ext_build::{build, build_cache, plan, BuildOptions, BuildOutcome, BuildPlan, Orchestrator};
