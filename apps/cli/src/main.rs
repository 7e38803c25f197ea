//! Datawalker CLI — merges per-section pages into one scroll narrative.
//!
//! Reads a section configuration, pulls styles, scripts, and content out of
//! each section page, and writes a single document built on a shared shell.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
