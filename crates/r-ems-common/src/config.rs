//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared primitives and utilities for the core runtime."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_launcher() -> PathBuf {
    PathBuf::from("dynawo.sh")
}

fn default_engine_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_stop_time() -> f64 {
    10.0
}

fn default_solver_lib() -> String {
    "dynawo_SolverIDA".to_owned()
}

fn default_solver_par_file() -> String {
    "solvers.par".to_owned()
}

fn default_solver_par_id() -> String {
    "IDA".to_owned()
}

fn default_models_par_file() -> String {
    "models.par".to_owned()
}

fn default_network_par_file() -> String {
    "network.par".to_owned()
}

fn default_network_par_id() -> String {
    "NETWORK".to_owned()
}

fn default_omega_ref_par_file() -> String {
    "omega_ref.par".to_owned()
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Configuration of the dynamic simulation tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicsConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where a [`DynamicsConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedDynamicsConfig {
    pub config: DynamicsConfig,
    pub source: PathBuf,
}

impl DynamicsConfig {
    pub const ENV_CONFIG_PATH: &str = "R_EMS_DYNAMICS_CONFIG";

    /// Load configuration from disk, respecting the `R_EMS_DYNAMICS_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedDynamicsConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedDynamicsConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedDynamicsConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<DynamicsConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for DynamicsConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: DynamicsConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// External simulation engine invocation.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_launcher")]
    pub launcher: PathBuf,
    #[serde(default = "default_engine_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
    /// Keep the working directory after the run.
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            launcher: default_launcher(),
            timeout: default_engine_timeout(),
            debug: false,
            extra_args: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.launcher.as_os_str().is_empty() {
            return Err(anyhow!("engine launcher must not be empty"));
        }
        if self.timeout.is_zero() {
            return Err(anyhow!("engine timeout must be greater than zero"));
        }
        Ok(())
    }
}

/// One curve to record, `model` being a dynamic model id or `NETWORK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveRequest {
    pub model: String,
    pub variable: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub start_time: f64,
    #[serde(default = "default_stop_time")]
    pub stop_time: f64,
    #[serde(default = "default_solver_lib")]
    pub solver_lib: String,
    #[serde(default = "default_solver_par_file")]
    pub solver_par_file: String,
    #[serde(default = "default_solver_par_id")]
    pub solver_par_id: String,
    #[serde(default = "default_models_par_file")]
    pub models_par_file: String,
    #[serde(default = "default_network_par_file")]
    pub network_par_file: String,
    #[serde(default = "default_network_par_id")]
    pub network_par_id: String,
    #[serde(default = "default_omega_ref_par_file")]
    pub omega_ref_par_file: String,
    #[serde(default)]
    pub curves: Vec<CurveRequest>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            stop_time: default_stop_time(),
            solver_lib: default_solver_lib(),
            solver_par_file: default_solver_par_file(),
            solver_par_id: default_solver_par_id(),
            models_par_file: default_models_par_file(),
            network_par_file: default_network_par_file(),
            network_par_id: default_network_par_id(),
            omega_ref_par_file: default_omega_ref_par_file(),
            curves: Vec::new(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stop_time <= self.start_time {
            return Err(anyhow!(
                "simulation stop_time ({}) must be greater than start_time ({})",
                self.stop_time,
                self.start_time
            ));
        }
        let files = [
            ("solver_par_file", &self.solver_par_file),
            ("models_par_file", &self.models_par_file),
            ("network_par_file", &self.network_par_file),
            ("omega_ref_par_file", &self.omega_ref_par_file),
        ];
        for (field, value) in files {
            if value.trim().is_empty() {
                return Err(anyhow!("simulation {field} must not be empty"));
            }
        }
        for curve in &self.curves {
            if curve.model.is_empty() || curve.variable.is_empty() {
                return Err(anyhow!("curve requests need both a model and a variable"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: DynamicsConfig = "".parse().unwrap();
        assert_eq!(config.engine.launcher, PathBuf::from("dynawo.sh"));
        assert_eq!(config.engine.timeout, Duration::from_secs(600));
        assert_eq!(config.simulation.stop_time, 10.0);
        assert_eq!(config.simulation.solver_par_id, "IDA");
        assert_eq!(config.logging.format, LogFormat::StructuredJson);
    }

    #[test]
    fn sections_override_defaults() {
        let config: DynamicsConfig = r#"
[engine]
launcher = "/opt/dynawo/dynawo.sh"
timeout = 30
debug = true

[simulation]
start_time = 1.0
stop_time = 20.0

[[simulation.curves]]
model = "G1"
variable = "generator_omegaPu"

[logging]
format = "pretty"
"#
        .parse()
        .unwrap();
        assert_eq!(config.engine.timeout, Duration::from_secs(30));
        assert!(config.engine.debug);
        assert_eq!(config.simulation.curves.len(), 1);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn rejects_inverted_window() {
        let err = "[simulation]\nstart_time = 5.0\nstop_time = 5.0\n"
            .parse::<DynamicsConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("stop_time"));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!("[engine]\ntimeout = 0\n".parse::<DynamicsConfig>().is_err());
    }
}
