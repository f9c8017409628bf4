//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared primitives and utilities for the core runtime."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Shared primitives for the dynamic simulation workspace: configuration
//! loading and the tracing bootstrap used by the binaries.

pub mod config;
pub mod logging;

pub use config::{CurveRequest, DynamicsConfig, EngineConfig, LoggingConfig, SimulationConfig};
pub use logging::{init_tracing, LogFormat};
