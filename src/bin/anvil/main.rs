//! Anvil CLI - native extension build orchestrator

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use anvil::builder::BuildError;
use anvil::core::ManifestError;
use anvil::util::diagnostic::{suggestions, Diagnostic};
use anvil::GlobalContext;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && io::stderr().is_terminal();
    // Verbose builds stream tool output live; diagnostics do not repeat it.
    let echoed = cli.verbose;

    if let Err(e) = run(cli, color) {
        if let Some(build_err) = e.downcast_ref::<BuildError>() {
            eprint!("{}", build_err.to_diagnostic(echoed).format(color));
        } else if let Some(manifest_err) = e.downcast_ref::<ManifestError>() {
            let diag = Diagnostic::error(manifest_err.to_string())
                .with_suggestion(suggestions::NO_MANIFEST);
            eprint!("{}", diag.format(color));
        } else {
            eprintln!("error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("anvil=debug")
    } else {
        EnvFilter::new("anvil=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(color)
        .with_writer(io::stderr)
        .init();

    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(cli.verbose);
    ctx.set_color(color);

    match cli.command {
        Commands::Build(args) => commands::build::execute(&ctx, args),
        Commands::Plan(args) => commands::plan::execute(&ctx, args),
        Commands::Doctor => commands::doctor::execute(&ctx),
        Commands::Clean(args) => commands::clean::execute(&ctx, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
