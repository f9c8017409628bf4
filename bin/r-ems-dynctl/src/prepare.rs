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

use anyhow::Result;
use clap::Args;
use r_ems_dynasim::{DynamicSimulation, SimulationJob};
use serde_json::json;

use crate::inputs::InputOptions;

#[derive(Debug, Args)]
pub struct PrepareCommand {
    #[command(flatten)]
    pub inputs: InputOptions,

    /// Directory receiving the engine input files.
    #[arg(long, value_name = "DIR")]
    pub workdir: PathBuf,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the prepare command.
pub fn run(command: PrepareCommand) -> Result<()> {
    let (config, inputs) = command.inputs.start()?;
    let simulation = DynamicSimulation::new(config);
    let job = simulation.prepare(&command.workdir, &inputs)?;
    if command.json {
        println!("{}", serde_json::to_string_pretty(&job_summary(&job))?);
    } else {
        render_job(&job);
    }
    Ok(())
}

fn job_summary(job: &SimulationJob) -> serde_json::Value {
    let architecture = &job.architecture;
    json!({
        "workdir": job.workdir,
        "jobs": job.jobs_file,
        "dyd": job.dyd_file,
        "curves": job.curves_file,
        "blackBoxModels": architecture.black_box_models.len(),
        "macroConnectors": architecture.macro_connectors.len(),
        "macroConnects": architecture.macro_connects.len(),
        "macroStaticReferences": architecture.macro_static_references.len(),
        "unconnectedModels": architecture.unconnected_models,
    })
}

fn render_job(job: &SimulationJob) {
    let architecture = &job.architecture;
    println!("Working directory: {}", job.workdir.display());
    println!("Jobs file: {}", job.jobs_file.display());
    println!(
        "Black box models: {}\nMacro connectors: {}\nMacro connects: {}\nStatic references: {}",
        architecture.black_box_models.len(),
        architecture.macro_connectors.len(),
        architecture.macro_connects.len(),
        architecture.macro_static_references.len()
    );
    if !architecture.unconnected_models.is_empty() {
        println!("Dropped (unconnected): {}", architecture.unconnected_models.join(", "));
    }
}
