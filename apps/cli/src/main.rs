//! certnorm CLI: normalize certification exam schedule and content data.
//!
//! Reads table JSON, HTML fragments, or crawler documents from disk and prints
//! canonical JSON.

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
