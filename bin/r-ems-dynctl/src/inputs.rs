//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Control CLI preparing and running dynamic simulations."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Options shared by every subcommand: input files, configuration, logging.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Args;
use r_ems_common::{init_tracing, DynamicsConfig};
use r_ems_dynamics::xml::Curve;
use r_ems_dynasim::SimulationInputs;
use tracing::warn;

const CONFIG_CANDIDATES: [&str; 2] = ["configs/dynamics.toml", "dynamics.toml"];

#[derive(Debug, Args)]
pub struct InputOptions {
    /// Network file (JSON or YAML).
    #[arg(long, value_name = "FILE")]
    pub network: PathBuf,

    /// Dynamic model definitions (JSON or YAML list).
    #[arg(long, value_name = "FILE")]
    pub models: PathBuf,

    /// Model parameter sets (JSON or YAML).
    #[arg(long, value_name = "FILE")]
    pub parameters: Option<PathBuf>,

    /// Configuration file; defaults to configs/dynamics.toml or R_EMS_DYNAMICS_CONFIG.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base name of the generated files (defaults to the network file stem).
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Curve to record, as MODEL:VARIABLE. Adds to the configured curves.
    #[arg(long = "curve", value_name = "MODEL:VARIABLE", value_parser = parse_curve)]
    pub curves: Vec<Curve>,

    /// Extra file copied into the working directory (solver or network parameters).
    #[arg(long = "copy", value_name = "FILE")]
    pub extra_files: Vec<PathBuf>,

    /// Write JSON logs to this directory instead of the development console output.
    #[arg(long = "log-dir", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

impl InputOptions {
    /// Load the configuration, initialize logging, then load the inputs.
    pub fn start(&self) -> Result<(DynamicsConfig, SimulationInputs)> {
        let config = match &self.config {
            Some(path) => Some(DynamicsConfig::load(&[path])?),
            None if has_config_source() => Some(DynamicsConfig::load(&CONFIG_CANDIDATES)?),
            None => None,
        };
        let fallback = config.is_none();
        let config = config.unwrap_or_default();
        self.init_logging(&config)?;
        if fallback {
            warn!(
                inspected = %CONFIG_CANDIDATES.join(", "),
                "no configuration file found, using built-in defaults"
            );
        }
        let inputs = self.load_inputs()?;
        Ok((config, inputs))
    }

    fn init_logging(&self, config: &DynamicsConfig) -> Result<()> {
        match &self.log_dir {
            Some(directory) => {
                let mut logging = config.logging.clone();
                logging.directory = directory.clone();
                init_tracing("r-ems-dynctl", &logging)
            }
            None => {
                r_ems_logging::init();
                Ok(())
            }
        }
    }

    fn load_inputs(&self) -> Result<SimulationInputs> {
        let mut inputs =
            SimulationInputs::from_files(&self.network, &self.models, self.parameters.as_deref())
                .with_context(|| format!("unable to load inputs for {}", self.network.display()))?;
        if let Some(name) = &self.name {
            inputs.name = name.clone();
        }
        inputs = inputs.with_curves(self.curves.iter().cloned());
        for extra in &self.extra_files {
            inputs = inputs.with_extra_file(extra);
        }
        Ok(inputs)
    }
}

fn has_config_source() -> bool {
    std::env::var_os(DynamicsConfig::ENV_CONFIG_PATH).is_some_and(|path| !path.is_empty())
        || CONFIG_CANDIDATES.iter().any(|candidate| Path::new(candidate).exists())
}

fn parse_curve(raw: &str) -> Result<Curve> {
    let (model, variable) = raw
        .split_once(':')
        .filter(|(model, variable)| !model.is_empty() && !variable.is_empty())
        .ok_or_else(|| anyhow!("expected MODEL:VARIABLE, got '{raw}'"))?;
    Ok(Curve {
        model: model.to_owned(),
        variable: variable.to_owned(),
    })
}
