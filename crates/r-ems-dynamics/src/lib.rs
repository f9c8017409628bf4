//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Dynamic model assembly for R-EMS dynamic simulations.
//!
//! The crate turns a read-only equipment [`network::Network`] and a set of
//! [`models::BlackBoxModel`]s into the model architecture consumed by the
//! external simulation engine: black-box model declarations, deduplicated
//! macro connectors, macro connects and macro static references, plus the
//! OmegaRef frequency synchronisation parameters. The numerical work itself is
//! left to the engine.

pub mod builders;
pub mod context;
pub mod error;
pub mod macro_connections;
pub mod models;
pub mod network;
pub mod parameters;
pub mod report;
pub mod xml;

pub use context::{AssemblyOptions, DynamicsContext, ModelsArchitecture};
pub use error::{DynamicsError, Result};
pub use models::{BlackBoxModel, ModelCatalog};
pub use network::Network;
pub use parameters::{ParameterDatabase, ParametersDatabase, ParametersSet};
pub use report::{ReportNode, Severity};
