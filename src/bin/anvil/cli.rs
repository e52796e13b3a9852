//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Anvil - build a native interpreter extension with CMake and package it
#[derive(Parser)]
#[command(name = "anvil")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the native extension and assemble the package
    Build(BuildArgs),

    /// Print the configure and build invocations as JSON without running them
    Plan(BuildArgs),

    /// Check the build environment
    Doctor,

    /// Remove build output
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// CMake source directory (defaults to `extension.source_dir`)
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Also remove the cached sub-builds
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
