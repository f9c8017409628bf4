//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Control CLI preparing and running dynamic simulations."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use r_ems_dynasim::{DynamicSimulation, DynamicSimulationResult, SimulationStatus};
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tracing::info;

use crate::inputs::InputOptions;

#[derive(Debug, Args)]
pub struct RunCommand {
    #[command(flatten)]
    pub inputs: InputOptions,

    /// Working directory; a temporary one is used when omitted.
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Print the collected results as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the run command. Fails when the engine reports a failure.
pub fn run(command: RunCommand) -> Result<()> {
    let (config, inputs) = command.inputs.start()?;
    let keep_workdir = config.engine.debug;
    let simulation = DynamicSimulation::new(config);

    let (workdir, scratch) = match command.workdir.clone() {
        Some(dir) => (dir, None),
        None => {
            let scratch = TempDir::new()?;
            (scratch.path().to_path_buf(), Some(scratch))
        }
    };

    let runtime = Runtime::new()?;
    let result = runtime.block_on(simulation.run(&workdir, &inputs))?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render_result(&result);
    }

    if keep_workdir {
        if let Some(scratch) = scratch {
            let kept = scratch.keep();
            info!(workdir = %kept.display(), "debug mode, working directory kept");
        }
    }

    if result.status == SimulationStatus::Failure {
        bail!("dynamic simulation of {} failed", inputs.name);
    }
    Ok(())
}

fn render_result(result: &DynamicSimulationResult) {
    println!("Status: {:?}", result.status);
    for series in result.curves.values() {
        match series.last_value() {
            Some(value) => println!("  {} = {value} ({} points)", series.name, series.points.len()),
            None => println!("  {} (no points)", series.name),
        }
    }
    if !result.timeline.is_empty() {
        println!("Timeline:");
        for event in &result.timeline {
            println!("  {:>10.4} | {} | {}", event.time, event.model, event.message);
        }
    }
    if let Some(error) = &result.error {
        println!("Engine error output:\n{error}");
    }
}
