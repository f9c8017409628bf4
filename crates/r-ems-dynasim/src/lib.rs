//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic simulation job preparation, launch and results retrieval."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Runs dynamic simulations with an external engine: prepares the working
//! directory from the assembled model architecture, launches the engine and
//! reads back curves and timeline.

pub mod error;
pub mod job;
pub mod launcher;
pub mod results;

use std::path::Path;

use r_ems_common::DynamicsConfig;
use r_ems_logging::{ems_error, log_stage_event, LogContext, StageOutcome};

pub use error::{Result, SimulationError};
pub use job::{SimulationInputs, SimulationJob};
pub use launcher::{DynawoLauncher, ExecutionReport};
pub use results::{DynamicSimulationResult, SimulationStatus, TimeSeries, TimelineEvent};

/// Prepare, launch, collect.
#[derive(Debug, Clone)]
pub struct DynamicSimulation {
    config: DynamicsConfig,
    launcher: DynawoLauncher,
}

impl DynamicSimulation {
    pub fn new(config: DynamicsConfig) -> Self {
        let launcher = DynawoLauncher::from_config(&config.engine);
        Self { config, launcher }
    }

    pub fn config(&self) -> &DynamicsConfig {
        &self.config
    }

    pub fn prepare(&self, workdir: &Path, inputs: &SimulationInputs) -> Result<SimulationJob> {
        SimulationJob::prepare(workdir, inputs, &self.config.simulation)
    }

    /// A non-zero engine exit yields a [`SimulationStatus::Failure`] result
    /// carrying the engine error output. A missing launcher or a timeout is
    /// an error.
    pub async fn run(&self, workdir: &Path, inputs: &SimulationInputs) -> Result<DynamicSimulationResult> {
        let job = self.prepare(workdir, inputs)?;
        let context = LogContext::new().with_run(&inputs.name);
        let curves_expected = job.curves_file.is_some();

        match self.launcher.run(&job.jobs_file).await {
            Ok(_) => {
                let result = DynamicSimulationResult::collect(workdir, SimulationStatus::Success, curves_expected)?;
                log_stage_event(
                    Some(&context),
                    "engine",
                    &format!("{} curves, {} timeline events", result.curves.len(), result.timeline.len()),
                    StageOutcome::Success,
                );
                Ok(result)
            }
            Err(SimulationError::ExecutionFailed { status, stderr }) => {
                ems_error!(context = context, "engine exited with status {status:?}");
                let mut result = DynamicSimulationResult::collect(workdir, SimulationStatus::Failure, false)?;
                result.error = Some(stderr);
                log_stage_event(Some(&context), "engine", "engine run failed", StageOutcome::Fault);
                Ok(result)
            }
            Err(err) => Err(err),
        }
    }
}
