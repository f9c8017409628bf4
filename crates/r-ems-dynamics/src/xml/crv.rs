//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Curves request file (`.crv`).

use hard_xml::XmlWrite;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::xml::{to_document, DYNAWO_NAMESPACE};

/// A variable to record during the simulation. `model` is a dynamic model id,
/// or `NETWORK` for variables of the network model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, XmlWrite)]
#[xml(tag = "curve")]
pub struct Curve {
    #[xml(attr = "model")]
    pub model: String,
    #[xml(attr = "variable")]
    pub variable: String,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "curvesInput")]
pub struct CurvesInputXml {
    #[xml(attr = "xmlns")]
    pub xmlns: String,
    #[xml(child = "curve")]
    pub curves: Vec<Curve>,
}

pub fn write_curves(curves: &[Curve]) -> Result<String> {
    to_document(&CurvesInputXml {
        xmlns: DYNAWO_NAMESPACE.to_owned(),
        curves: curves.to_vec(),
    })
}
