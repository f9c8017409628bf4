//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic simulation job preparation, launch and results retrieval."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use r_ems_common::EngineConfig;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{Result, SimulationError};

/// Captured output of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Runs the engine launcher script as `<launcher> jobs <file>`.
#[derive(Debug, Clone)]
pub struct DynawoLauncher {
    program: PathBuf,
    timeout: Duration,
    extra_args: Vec<String>,
}

impl DynawoLauncher {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            program: config.launcher.clone(),
            timeout: config.timeout,
            extra_args: config.extra_args.clone(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run the job in `jobs_file`, from its parent directory. The process is
    /// killed when the timeout elapses.
    pub async fn run(&self, jobs_file: &Path) -> Result<ExecutionReport> {
        let workdir = jobs_file
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = jobs_file
            .file_name()
            .ok_or_else(|| SimulationError::MissingOutput(jobs_file.to_path_buf()))?;
        let mut command = Command::new(&self.program);
        command
            .arg("jobs")
            .arg(file_name)
            .args(&self.extra_args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program.display(), jobs = %jobs_file.display(), "launching engine");
        let started = Instant::now();
        let child = command.spawn().map_err(|err| match err.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                SimulationError::LauncherNotFound(self.program.clone())
            }
            _ => SimulationError::Io(err),
        })?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(timeout = ?self.timeout, "engine run timed out, process killed");
                return Err(SimulationError::Timeout(self.timeout));
            }
        };

        let report = ExecutionReport {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed: started.elapsed(),
        };
        if !output.status.success() {
            return Err(SimulationError::ExecutionFailed {
                status: report.status,
                stderr: report.stderr,
            });
        }
        info!(elapsed = ?report.elapsed, "engine run completed");
        Ok(report)
    }
}
