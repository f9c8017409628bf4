//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Dynamic models file (`.dyd`).

use hard_xml::XmlWrite;

use crate::context::{BlackBoxModelEntry, ModelsArchitecture};
use crate::error::Result;
use crate::macro_connections::{MacroConnect, MacroConnector, MacroStaticReference};
use crate::xml::{to_document, DYNAWO_NAMESPACE};

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:dynamicModelsArchitecture")]
pub struct DynamicModelsArchitectureXml {
    #[xml(attr = "xmlns:dyn")]
    pub xmlns: String,
    #[xml(child = "dyn:blackBoxModel")]
    pub black_box_models: Vec<BlackBoxModelXml>,
    #[xml(child = "dyn:macroConnector")]
    pub macro_connectors: Vec<MacroConnectorXml>,
    #[xml(child = "dyn:macroStaticReference")]
    pub macro_static_references: Vec<MacroStaticReferenceXml>,
    #[xml(child = "dyn:macroConnect")]
    pub macro_connects: Vec<MacroConnectXml>,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:blackBoxModel")]
pub struct BlackBoxModelXml {
    #[xml(attr = "id")]
    pub id: String,
    #[xml(attr = "lib")]
    pub lib: String,
    #[xml(attr = "parFile")]
    pub par_file: String,
    #[xml(attr = "parId")]
    pub par_id: String,
    #[xml(attr = "staticId")]
    pub static_id: Option<String>,
    #[xml(child = "dyn:macroStaticRef")]
    pub macro_static_ref: Option<MacroStaticRefXml>,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:macroStaticRef")]
pub struct MacroStaticRefXml {
    #[xml(attr = "id")]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:macroConnector")]
pub struct MacroConnectorXml {
    #[xml(attr = "id")]
    pub id: String,
    #[xml(child = "dyn:connect")]
    pub connections: Vec<ConnectXml>,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:connect")]
pub struct ConnectXml {
    #[xml(attr = "var1")]
    pub var1: String,
    #[xml(attr = "var2")]
    pub var2: String,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:macroStaticReference")]
pub struct MacroStaticReferenceXml {
    #[xml(attr = "id")]
    pub id: String,
    #[xml(child = "dyn:staticRef")]
    pub mappings: Vec<StaticRefXml>,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:staticRef")]
pub struct StaticRefXml {
    #[xml(attr = "var")]
    pub var: String,
    #[xml(attr = "staticVar")]
    pub static_var: String,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:macroConnect")]
pub struct MacroConnectXml {
    #[xml(attr = "connector")]
    pub connector: String,
    #[xml(attr = "id1")]
    pub id1: String,
    #[xml(attr = "index1")]
    pub index1: Option<String>,
    #[xml(attr = "id2")]
    pub id2: String,
    #[xml(attr = "name2")]
    pub name2: Option<String>,
}

impl From<&BlackBoxModelEntry> for BlackBoxModelXml {
    fn from(entry: &BlackBoxModelEntry) -> Self {
        Self {
            id: entry.id.clone(),
            lib: entry.lib.clone(),
            par_file: entry.par_file.clone(),
            par_id: entry.par_id.clone(),
            static_id: entry.static_id.clone(),
            macro_static_ref: entry
                .macro_static_ref
                .clone()
                .map(|id| MacroStaticRefXml { id }),
        }
    }
}

impl From<&MacroConnector> for MacroConnectorXml {
    fn from(connector: &MacroConnector) -> Self {
        Self {
            id: connector.id.clone(),
            connections: connector
                .connections
                .iter()
                .map(|connection| ConnectXml {
                    var1: connection.var1.clone(),
                    var2: connection.var2.clone(),
                })
                .collect(),
        }
    }
}

impl From<&MacroStaticReference> for MacroStaticReferenceXml {
    fn from(reference: &MacroStaticReference) -> Self {
        Self {
            id: reference.id.clone(),
            mappings: reference
                .mappings
                .iter()
                .map(|mapping| StaticRefXml {
                    var: mapping.dynamic_var.clone(),
                    static_var: mapping.static_var.clone(),
                })
                .collect(),
        }
    }
}

impl From<&MacroConnect> for MacroConnectXml {
    fn from(connect: &MacroConnect) -> Self {
        Self {
            connector: connect.connector.clone(),
            id1: connect.id1.clone(),
            index1: connect.index1.map(|index| index.to_string()),
            id2: connect.id2.clone(),
            name2: connect.name2.clone(),
        }
    }
}

impl From<&ModelsArchitecture> for DynamicModelsArchitectureXml {
    fn from(architecture: &ModelsArchitecture) -> Self {
        Self {
            xmlns: DYNAWO_NAMESPACE.to_owned(),
            black_box_models: architecture.black_box_models.iter().map(Into::into).collect(),
            macro_connectors: architecture.macro_connectors.iter().map(Into::into).collect(),
            macro_static_references: architecture
                .macro_static_references
                .iter()
                .map(Into::into)
                .collect(),
            macro_connects: architecture.macro_connects.iter().map(Into::into).collect(),
        }
    }
}

pub fn write_dynamic_models(architecture: &ModelsArchitecture) -> Result<String> {
    to_document(&DynamicModelsArchitectureXml::from(architecture))
}
