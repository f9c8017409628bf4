//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Black-box model representation.
//!
//! Every model, whether bound to network equipment, a pure-dynamic automaton
//! or a network default, is a [`BlackBoxModel`]: a shared `(config, var
//! mapping)` value plus a closed [`ModelVariant`]. Capabilities are computed
//! once at construction.

pub mod automatons;
pub mod capability;
pub mod catalog;
pub mod defaults;
pub mod equipment;
pub mod omega_ref;
pub mod registry;

use crate::error::{DynamicsError, Result};
use crate::macro_connections::{MacroConnectionsAdder, VarConnection, VarMapping, NETWORK_ID};

pub use automatons::Automaton;
pub use capability::{Capability, CapabilitySet, Port, TransformerSide};
pub use catalog::{ModelCatalog, ModelCategory, ModelConfig};
pub use defaults::{DefaultModelsHandler, NetworkEquipment};
pub use equipment::{EquipmentFamily, EquipmentModel, GeneratorKind, LoadKind};
pub use omega_ref::OmegaRef;
pub use registry::ModelRegistry;

/// Outcome of a model's connection hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Connected,
    /// Nothing the model needs could be reached: it is dropped from the output.
    Unconnected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelVariant {
    Equipment(EquipmentModel),
    Automaton(Automaton),
    NetworkDefault(NetworkEquipment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlackBoxModel {
    dynamic_model_id: String,
    parameter_set_id: String,
    config: ModelConfig,
    variant: ModelVariant,
    capabilities: CapabilitySet,
}

impl BlackBoxModel {
    pub fn new(
        dynamic_model_id: impl Into<String>,
        parameter_set_id: impl Into<String>,
        config: ModelConfig,
        variant: ModelVariant,
    ) -> Self {
        let capabilities = match &variant {
            ModelVariant::Equipment(equipment) => equipment.capabilities(),
            ModelVariant::Automaton(automaton) => automaton.capabilities(),
            ModelVariant::NetworkDefault(default) => default.capabilities(),
        };
        Self {
            dynamic_model_id: dynamic_model_id.into(),
            parameter_set_id: parameter_set_id.into(),
            config,
            variant,
            capabilities,
        }
    }

    pub fn dynamic_model_id(&self) -> &str {
        &self.dynamic_model_id
    }

    pub fn parameter_set_id(&self) -> &str {
        &self.parameter_set_id
    }

    pub fn lib(&self) -> &str {
        &self.config.lib
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn variant(&self) -> &ModelVariant {
        &self.variant
    }

    /// Bound equipment id, absent for pure-dynamic models.
    pub fn static_id(&self) -> Option<&str> {
        match &self.variant {
            ModelVariant::Equipment(equipment) => Some(&equipment.static_id),
            ModelVariant::NetworkDefault(default) => Some(&default.static_id),
            ModelVariant::Automaton(_) => None,
        }
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn is_network_default(&self) -> bool {
        matches!(self.variant, ModelVariant::NetworkDefault(_))
    }

    /// Tap-changer-blocking automatons are connected after every other model.
    pub fn connects_last(&self) -> bool {
        matches!(
            self.variant,
            ModelVariant::Automaton(Automaton::TapChangerBlocking(_))
        )
    }

    pub(crate) fn prefix(&self) -> &str {
        match &self.variant {
            ModelVariant::Equipment(equipment) => self
                .config
                .internal_model_prefix
                .as_deref()
                .unwrap_or_else(|| equipment.family.default_prefix()),
            ModelVariant::Automaton(automaton) => self
                .config
                .internal_model_prefix
                .as_deref()
                .unwrap_or_else(|| automaton.default_prefix()),
            ModelVariant::NetworkDefault(_) => "",
        }
    }

    pub fn var(&self, port: Port) -> Option<String> {
        match &self.variant {
            ModelVariant::Equipment(equipment) => equipment.var(self.prefix(), port),
            ModelVariant::Automaton(automaton) => automaton.var(self.prefix(), port),
            ModelVariant::NetworkDefault(default) => default.var(port),
        }
    }

    pub fn require_var(&self, port: Port) -> Result<String> {
        self.var(port).ok_or_else(|| DynamicsError::MissingVariable {
            model: self.dynamic_model_id.clone(),
            lib: self.config.lib.clone(),
            port: port.to_string(),
        })
    }

    /// Dynamic variable to network attribute mapping; empty for pure-dynamic models.
    pub fn var_mapping(&self) -> Vec<VarMapping> {
        match &self.variant {
            ModelVariant::Equipment(equipment) => equipment.var_mapping(self.prefix()),
            ModelVariant::Automaton(_) | ModelVariant::NetworkDefault(_) => Vec::new(),
        }
    }

    /// `(id2, name2)` attributes used when this model is the second side of a connect.
    pub fn connect_target(&self) -> (String, Option<String>) {
        match &self.variant {
            ModelVariant::NetworkDefault(default) => {
                (NETWORK_ID.to_owned(), Some(default.static_id.clone()))
            }
            _ => (self.dynamic_model_id.clone(), None),
        }
    }

    /// Variables linked to the OmegaRef aggregator, OmegaRef side first.
    pub fn omega_ref_connections(&self) -> Result<Vec<VarConnection>> {
        let ModelVariant::Equipment(equipment) = &self.variant else {
            return Ok(Vec::new());
        };
        let EquipmentFamily::Generator(kind) = equipment.family else {
            return Ok(Vec::new());
        };
        let mut connections = Vec::with_capacity(3);
        if kind == GeneratorKind::Synchronous {
            connections.push(VarConnection::new(
                "omega_grp_@INDEX@",
                self.require_var(Port::OmegaPu)?,
            ));
        }
        if kind != GeneratorKind::Fictitious {
            connections.push(VarConnection::new(
                "omegaRef_grp_@INDEX@",
                self.require_var(Port::OmegaRefPu)?,
            ));
            connections.push(VarConnection::new(
                "running_grp_@INDEX@",
                self.require_var(Port::Running)?,
            ));
        }
        Ok(connections)
    }

    /// Ask the model to request its own connections through `adder`.
    pub fn create_macro_connections(
        &self,
        adder: &mut MacroConnectionsAdder<'_>,
    ) -> Result<Connectivity> {
        match &self.variant {
            ModelVariant::Equipment(equipment) => equipment.create_macro_connections(self, adder),
            ModelVariant::Automaton(automaton) => automaton.create_macro_connections(self, adder),
            ModelVariant::NetworkDefault(_) => Ok(Connectivity::Connected),
        }
    }
}
