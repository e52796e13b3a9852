//! `anvil build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use anvil::ops::{assemble, build, BuildOptions};
use anvil::util::{GlobalContext, SystemExecutor};

pub fn execute(ctx: &GlobalContext, args: BuildArgs) -> Result<()> {
    let (project, config) = super::load_project(ctx)?;
    let options = BuildOptions {
        base_dir: args.base_dir,
    };

    let executor = if ctx.is_verbose() {
        SystemExecutor::echoing()
    } else {
        SystemExecutor::new()
    };

    let outcome = build(&project, config, &executor, &options)?;
    let package = assemble(&project, &outcome.artifact_dir)?;

    eprintln!(
        "{:>12} {} v{} -> {}",
        "Finished",
        project.manifest().package.name,
        project.manifest().package.version,
        package.artifact.display()
    );

    Ok(())
}
