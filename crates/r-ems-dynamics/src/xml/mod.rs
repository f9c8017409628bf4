//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Wire format of the simulation engine input files.
//!
//! Element and attribute names are fixed by the engine and must be emitted
//! exactly as declared here.

pub mod crv;
pub mod dyd;
pub mod jobs;
pub mod par;

use hard_xml::XmlWrite;

use crate::error::{DynamicsError, Result};

pub use crv::{write_curves, Curve};
pub use dyd::write_dynamic_models;
pub use jobs::{write_jobs, JobDescription};
pub use par::write_parameters;

pub const DYNAWO_NAMESPACE: &str = "http://www.rte-france.com/dynawo";
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serialize `root` as a standalone document.
pub(crate) fn to_document<T: XmlWrite>(root: &T) -> Result<String> {
    let body = XmlWrite::to_string(root).map_err(|err| DynamicsError::Xml(err.to_string()))?;
    Ok(format!("{XML_DECLARATION}\n{body}\n"))
}
