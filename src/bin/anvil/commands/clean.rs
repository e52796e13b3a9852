//! `anvil clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use anvil::ops::{clean, CleanOptions};
use anvil::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: CleanArgs) -> Result<()> {
    let (project, config) = super::load_project(ctx)?;

    let removed = clean(&project, &config, &CleanOptions { all: args.all })?;
    if removed.is_empty() {
        eprintln!("{:>12} nothing to clean", "Clean");
    }
    for dir in removed {
        eprintln!("{:>12} {}", "Removed", dir.display());
    }

    Ok(())
}
