//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic simulation job preparation, launch and results retrieval."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Working directory preparation: every input file the engine reads.

use std::fs;
use std::path::{Path, PathBuf};

use r_ems_common::SimulationConfig;
use r_ems_dynamics::builders::{build_models, load_definitions_from_file, ModelDefinition};
use r_ems_dynamics::network::load_network_from_file;
use r_ems_dynamics::parameters::load_parameters_from_file;
use r_ems_dynamics::xml::{
    write_curves, write_dynamic_models, write_jobs, write_parameters, Curve, JobDescription,
};
use r_ems_dynamics::{
    AssemblyOptions, DynamicsContext, ModelCatalog, ModelsArchitecture, Network,
    ParametersDatabase, ReportNode, Severity,
};
use r_ems_logging::{log_stage_event, LogContext, StageOutcome};
use tracing::{debug, info};

use crate::error::Result;

pub const REPORT_FILE: &str = "report.json";

/// Everything one simulation is prepared from.
#[derive(Debug, Clone)]
pub struct SimulationInputs {
    /// Base name of the generated files.
    pub name: String,
    pub network_file: PathBuf,
    pub network: Network,
    pub definitions: Vec<ModelDefinition>,
    pub parameters: ParametersDatabase,
    pub curves: Vec<Curve>,
    /// Files copied verbatim into the working directory (solver and network parameters).
    pub extra_files: Vec<PathBuf>,
}

impl SimulationInputs {
    /// Load the network, model definitions and optional parameter sets from disk.
    /// The simulation is named after the network file stem.
    pub fn from_files(
        network_file: &Path,
        definitions_file: &Path,
        parameters_file: Option<&Path>,
    ) -> Result<Self> {
        let network = load_network_from_file(network_file)?;
        let definitions = load_definitions_from_file(definitions_file)?;
        let parameters = match parameters_file {
            Some(path) => load_parameters_from_file(path)?,
            None => ParametersDatabase::new(),
        };
        let name = network_file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_owned)
            .unwrap_or_else(|| network.id.clone());
        Ok(Self {
            name,
            network_file: network_file.to_path_buf(),
            network,
            definitions,
            parameters,
            curves: Vec::new(),
            extra_files: Vec::new(),
        })
    }

    pub fn with_curves(mut self, curves: impl IntoIterator<Item = Curve>) -> Self {
        self.curves.extend(curves);
        self
    }

    pub fn with_extra_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_files.push(path.into());
        self
    }
}

/// A prepared working directory.
#[derive(Debug)]
pub struct SimulationJob {
    pub workdir: PathBuf,
    pub jobs_file: PathBuf,
    pub dyd_file: PathBuf,
    pub curves_file: Option<PathBuf>,
    pub architecture: ModelsArchitecture,
    pub report: ReportNode,
}

impl SimulationJob {
    /// Build the models, assemble the architecture and write the engine input files.
    /// Configured curves come first, then the curves of `inputs`.
    pub fn prepare(workdir: &Path, inputs: &SimulationInputs, config: &SimulationConfig) -> Result<Self> {
        fs::create_dir_all(workdir)?;
        let mut report = ReportNode::new_root(
            "dynamicSimulation",
            format!("Dynamic simulation on network {}", inputs.network.id),
        );

        let models = build_models(
            &inputs.definitions,
            &inputs.network,
            ModelCatalog::bundled(),
            &mut report,
        );
        let options = AssemblyOptions {
            models_par_file: config.models_par_file.clone(),
            omega_ref_par_file: config.omega_ref_par_file.clone(),
        };
        let assembly = report.add_child("assembly", "Dynamic models assembly");
        let architecture =
            DynamicsContext::new(&inputs.network, models, &inputs.parameters, options, assembly)?
                .assemble()?;

        let dyd_file = workdir.join(format!("{}.dyd", inputs.name));
        fs::write(&dyd_file, write_dynamic_models(&architecture)?)?;
        fs::write(
            workdir.join(&config.models_par_file),
            write_parameters(inputs.parameters.sets())?,
        )?;
        if let Some(omega_ref) = &architecture.omega_ref_parameters {
            fs::write(
                workdir.join(&config.omega_ref_par_file),
                write_parameters([omega_ref])?,
            )?;
        }

        let curves: Vec<Curve> = config
            .curves
            .iter()
            .map(|curve| Curve {
                model: curve.model.clone(),
                variable: curve.variable.clone(),
            })
            .chain(inputs.curves.iter().cloned())
            .collect();
        let curves_file = if curves.is_empty() {
            None
        } else {
            let path = workdir.join(format!("{}.crv", inputs.name));
            fs::write(&path, write_curves(&curves)?)?;
            Some(path)
        };

        let network_file_name = copy_into(workdir, &inputs.network_file)?;
        for extra in &inputs.extra_files {
            copy_into(workdir, extra)?;
        }

        let jobs_file = workdir.join(format!("{}.jobs", inputs.name));
        let job = JobDescription {
            name: inputs.name.clone(),
            solver_lib: config.solver_lib.clone(),
            solver_par_file: config.solver_par_file.clone(),
            solver_par_id: config.solver_par_id.clone(),
            network_file: network_file_name,
            network_par_file: config.network_par_file.clone(),
            network_par_id: config.network_par_id.clone(),
            dyd_file: file_name(&dyd_file),
            curves_file: curves_file.as_deref().map(file_name),
            start_time: config.start_time,
            stop_time: config.stop_time,
        };
        fs::write(&jobs_file, write_jobs(&job)?)?;

        report.report(
            "jobPrepared",
            format!("Input files written to {}", workdir.display()),
            Severity::Info,
        );
        fs::write(workdir.join(REPORT_FILE), report.to_json()?)?;

        let outcome = if report.max_severity() >= Severity::Warn {
            StageOutcome::Degraded
        } else {
            StageOutcome::Success
        };
        log_stage_event(
            Some(&LogContext::new().with_run(&inputs.name)),
            "prepare",
            &format!("{} black box models", architecture.black_box_models.len()),
            outcome,
        );
        info!(workdir = %workdir.display(), jobs = %jobs_file.display(), "simulation job prepared");

        Ok(Self {
            workdir: workdir.to_path_buf(),
            jobs_file,
            dyd_file,
            curves_file,
            architecture,
            report,
        })
    }
}

/// Copy `source` into `workdir` under its own file name and return that name.
fn copy_into(workdir: &Path, source: &Path) -> Result<String> {
    let name = file_name(source);
    let target = workdir.join(&name);
    if target != source {
        fs::copy(source, &target)?;
        debug!(source = %source.display(), target = %target.display(), "input file copied");
    }
    Ok(name)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
