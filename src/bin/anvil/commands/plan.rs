//! `anvil plan` command

use anyhow::Result;

use crate::cli::BuildArgs;
use anvil::ops::{plan, BuildOptions};
use anvil::util::{GlobalContext, SystemExecutor};

pub fn execute(ctx: &GlobalContext, args: BuildArgs) -> Result<()> {
    let (project, config) = super::load_project(ctx)?;
    let options = BuildOptions {
        base_dir: args.base_dir,
    };

    let plan = plan(&project, config, &SystemExecutor::new(), &options)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);

    Ok(())
}
