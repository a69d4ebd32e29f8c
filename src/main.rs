//! rastretch CLI entrypoint.
//!
//! Provides a thin wrapper over the `cli` module: parse args, run the selected
//! stretch or histogram dump, and exit with appropriate status.
//! For programmatic use, prefer the library API (`rastretch::api`).

use clap::Parser;

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();
    cli::run(args)
}
