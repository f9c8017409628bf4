//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structured logging adapters and sinks."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Structured logging shared by the dynamic simulation crates.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber suitable for development.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Simulation run, usually the network id.
    pub run: Option<&'a str>,
    /// Dynamic model id the event is about.
    pub model: Option<&'a str>,
    /// Engine library of that model.
    pub lib: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a run identifier.
    pub fn with_run(mut self, run: &'a str) -> Self {
        self.run = Some(run);
        self
    }

    /// Attach a dynamic model id.
    pub fn with_model(mut self, model: &'a str) -> Self {
        self.model = Some(model);
        self
    }

    /// Attach an engine library name.
    pub fn with_lib(mut self, lib: &'a str) -> Self {
        self.lib = Some(lib);
        self
    }
}

/// Outcome of one pipeline stage (assembly, file preparation, engine run).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage completed.
    Success,
    /// The stage completed but dropped or skipped work.
    Degraded,
    /// The stage failed.
    Fault,
}

impl StageOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            StageOutcome::Success => "success",
            StageOutcome::Degraded => "degraded",
            StageOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized stage event.
pub fn log_stage_event(context: Option<&LogContext>, stage: &str, message: &str, outcome: StageOutcome) {
    let ctx = context.cloned().unwrap_or_default();
    let run = ctx.run.unwrap_or("");
    match outcome {
        StageOutcome::Success => {
            tracing::info!(stage, outcome = outcome.as_str(), run, message = %message)
        }
        StageOutcome::Degraded => {
            tracing::warn!(stage, outcome = outcome.as_str(), run, message = %message)
        }
        StageOutcome::Fault => {
            tracing::error!(stage, outcome = outcome.as_str(), run, message = %message)
        }
    }
}
