//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic simulation job preparation, launch and results retrieval."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::time::Duration;

use r_ems_dynamics::DynamicsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimulationError>;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Dynamics(#[from] DynamicsError),
    #[error("engine launcher not found: {0}")]
    LauncherNotFound(PathBuf),
    #[error("engine run exceeded {0:?}")]
    Timeout(Duration),
    #[error("engine exited with status {status:?}: {stderr}")]
    ExecutionFailed { status: Option<i32>, stderr: String },
    #[error("expected engine output missing: {0}")]
    MissingOutput(PathBuf),
    #[error("invalid curves file: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid timeline line {line}: {content}")]
    Timeline { line: usize, content: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
