//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Output primitives of the assembly: macro connectors, macro connects and
//! macro static references.
//!
//! Connector and static reference ids are the only collision guard across a
//! model set, so the `MC_` / `MSR_` naming scheme must not change.

mod adder;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{DynamicsError, Result};
use crate::models::BlackBoxModel;

pub use adder::{ConnectSource, MacroConnectionsAdder};

pub const CONNECTOR_PREFIX: &str = "MC_";
pub const STATIC_REFERENCE_PREFIX: &str = "MSR_";
/// `id2` used when the second side is simulated inside the network model.
pub const NETWORK_ID: &str = "NETWORK";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VarConnection {
    pub var1: String,
    pub var2: String,
}

impl VarConnection {
    pub fn new(var1: impl Into<String>, var2: impl Into<String>) -> Self {
        Self {
            var1: var1.into(),
            var2: var2.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VarMapping {
    pub dynamic_var: String,
    pub static_var: String,
}

impl VarMapping {
    pub fn new(dynamic_var: impl Into<String>, static_var: impl Into<String>) -> Self {
        Self {
            dynamic_var: dynamic_var.into(),
            static_var: static_var.into(),
        }
    }
}

/// Template shared by every connection between two libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroConnector {
    pub id: String,
    pub connections: Vec<VarConnection>,
}

impl MacroConnector {
    pub fn id_for(lib1: &str, lib2: &str, suffix: Option<&str>) -> String {
        format!(
            "{CONNECTOR_PREFIX}{lib1}-{lib2}{}",
            suffix.unwrap_or_default()
        )
    }
}

/// One concrete connection following a connector template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroConnect {
    pub connector: String,
    pub id1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index1: Option<usize>,
    pub id2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name2: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroStaticReference {
    pub id: String,
    pub lib: String,
    pub mappings: Vec<VarMapping>,
}

impl MacroStaticReference {
    pub fn id_for(lib: &str) -> String {
        format!("{STATIC_REFERENCE_PREFIX}{lib}")
    }

    /// `None` for models without a variable mapping.
    pub fn of(model: &BlackBoxModel) -> Option<Self> {
        let mappings = model.var_mapping();
        if mappings.is_empty() {
            return None;
        }
        Some(Self {
            id: Self::id_for(model.lib()),
            lib: model.lib().to_owned(),
            mappings,
        })
    }
}

/// Connectors and connects requested by one model, not yet part of the output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedConnections {
    pub connectors: IndexMap<String, MacroConnector>,
    pub connects: Vec<MacroConnect>,
}

impl StagedConnections {
    pub fn is_empty(&self) -> bool {
        self.connects.is_empty()
    }
}

/// Insert `connector` unless its id is already known; a known id must carry
/// the same variable list.
pub fn merge_connector(
    connectors: &mut IndexMap<String, MacroConnector>,
    connector: MacroConnector,
) -> Result<()> {
    match connectors.get(&connector.id) {
        Some(existing) if existing.connections != connector.connections => {
            Err(DynamicsError::ConnectorPayloadMismatch(connector.id))
        }
        Some(_) => Ok(()),
        None => {
            connectors.insert(connector.id.clone(), connector);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_ids_follow_naming_scheme() {
        assert_eq!(
            MacroConnector::id_for("CurrentLimitAutomaton", "NetworkLine", Some("Side1")),
            "MC_CurrentLimitAutomaton-NetworkLineSide1"
        );
        assert_eq!(
            MacroConnector::id_for("DYNModelOmegaRef", "GeneratorPV", None),
            "MC_DYNModelOmegaRef-GeneratorPV"
        );
        assert_eq!(MacroStaticReference::id_for("LoadAlphaBeta"), "MSR_LoadAlphaBeta");
    }

    #[test]
    fn reuse_with_different_payload_is_rejected() {
        let mut connectors = IndexMap::new();
        let connector = MacroConnector {
            id: "MC_A-B".into(),
            connections: vec![VarConnection::new("a_x", "b_x")],
        };
        merge_connector(&mut connectors, connector.clone()).unwrap();
        merge_connector(&mut connectors, connector).unwrap();
        assert_eq!(connectors.len(), 1);

        let conflicting = MacroConnector {
            id: "MC_A-B".into(),
            connections: vec![VarConnection::new("a_y", "b_y")],
        };
        assert!(matches!(
            merge_connector(&mut connectors, conflicting),
            Err(DynamicsError::ConnectorPayloadMismatch(id)) if id == "MC_A-B"
        ));
    }
}
