//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Control CLI preparing and running dynamic simulations."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use anyhow::Result;
use clap::{Parser, Subcommand};

mod inputs;
mod prepare;
mod run;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "R-EMS dynamic simulation preparation and launch utility",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Assemble the dynamic models and write the engine input files.
    Prepare(prepare::PrepareCommand),
    /// Prepare, launch the engine and print the collected results.
    Run(run::RunCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Prepare(cmd) => prepare::run(cmd)?,
        Commands::Run(cmd) => run::run(cmd)?,
    }
    Ok(())
}
