//! Core data structures for Anvil.
//!
//! - The `Anvil.toml` manifest schema
//! - The project layout derived from it

pub mod manifest;
pub mod project;

pub use manifest::{ExtensionSpec, Manifest, PackageMetadata};
pub use project::{ManifestError, Project, MANIFEST_NAME};
