//! `anvil doctor` command

use anyhow::Result;

use anvil::builder::accelerator::signal_from_env;
use anvil::builder::HostPlatform;
use anvil::ops::{doctor, format_report};
use anvil::util::{GlobalContext, SystemExecutor};

pub fn execute(ctx: &GlobalContext) -> Result<()> {
    // Project config applies when run inside a project, but is not required.
    let config = match ctx.find_manifest() {
        Ok(manifest) => ctx.load_config(manifest.parent().unwrap_or(ctx.cwd())),
        Err(_) => ctx.load_config(ctx.cwd()),
    };

    let signal = signal_from_env();
    let report = doctor(
        &SystemExecutor::new(),
        &config,
        HostPlatform::current(),
        signal.as_deref(),
    );
    print!("{}", format_report(&report, ctx.is_verbose()));

    // Exit with error code if required checks failed
    if !report.all_required_passed() {
        std::process::exit(1);
    }

    Ok(())
}
