//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod doctor;
pub mod plan;

use anyhow::Result;

use anvil::core::Project;
use anvil::util::{Config, GlobalContext};

/// Load the project enclosing the working directory and its configuration.
fn load_project(ctx: &GlobalContext) -> Result<(Project, Config)> {
    let manifest_path = ctx.find_manifest()?;
    let project = Project::load(&manifest_path)?;
    let config = ctx.load_config(project.root());
    Ok((project, config))
}
