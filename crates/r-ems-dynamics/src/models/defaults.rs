//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Default models for equipment without an explicit dynamic model.
//!
//! Defaults are not emitted as black-box models: the engine already simulates
//! the equipment inside its network model, so connections address it through
//! `NETWORK` and the `@NAME@` placeholder the engine substitutes with the
//! equipment id.

use std::cell::RefCell;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{DynamicsError, Result};
use crate::models::capability::{Capability, CapabilitySet, Port};
use crate::models::catalog::ModelConfig;
use crate::models::{BlackBoxModel, ModelVariant};
use crate::network::{EquipmentType, Network};

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkEquipment {
    pub static_id: String,
    pub equipment_type: EquipmentType,
    pub tap_changer: bool,
}

impl NetworkEquipment {
    fn lib(equipment_type: EquipmentType) -> Option<&'static str> {
        match equipment_type {
            EquipmentType::Bus => Some("NetworkBus"),
            EquipmentType::Line => Some("NetworkLine"),
            EquipmentType::TwoWindingsTransformer => Some("NetworkTransformer"),
            EquipmentType::Generator => Some("NetworkGenerator"),
            EquipmentType::Load => Some("NetworkLoad"),
            EquipmentType::ShuntCompensator => None,
        }
    }

    pub(crate) fn capabilities(&self) -> CapabilitySet {
        let set = CapabilitySet::empty();
        match self.equipment_type {
            EquipmentType::Bus => set.with(Capability::Bus),
            EquipmentType::Line => set.with(Capability::Line),
            EquipmentType::TwoWindingsTransformer if self.tap_changer => set
                .with(Capability::Transformer)
                .with(Capability::TapChangeable),
            EquipmentType::TwoWindingsTransformer => set.with(Capability::Transformer),
            EquipmentType::Generator => set.with(Capability::Generator),
            EquipmentType::Load => set.with(Capability::Load),
            EquipmentType::ShuntCompensator => set,
        }
    }

    pub(crate) fn var(&self, port: Port) -> Option<String> {
        let var = match (self.equipment_type, port) {
            (EquipmentType::Bus, Port::Terminal) => "@@NAME@@@NODE@_ACPIN".to_owned(),
            (EquipmentType::Bus, Port::SwitchOff) => "@@NAME@@@NODE@_switchOff".to_owned(),
            (EquipmentType::Bus, Port::Numcc) => "@@NAME@@@NODE@_numcc".to_owned(),
            (EquipmentType::Bus, Port::UPu) => "@@NAME@@@NODE@_Upu_value".to_owned(),

            (EquipmentType::Line | EquipmentType::TwoWindingsTransformer, Port::State) => {
                "@NAME@_state".to_owned()
            }
            (
                EquipmentType::Line | EquipmentType::TwoWindingsTransformer,
                Port::CurrentLimitsDeactivation,
            ) => "@NAME@_desactivate_currentLimits".to_owned(),
            (EquipmentType::Line | EquipmentType::TwoWindingsTransformer, Port::Current(side)) => {
                format!("@NAME@_i{}", side.suffix())
            }
            (EquipmentType::TwoWindingsTransformer, Port::TapLocked(_)) if self.tap_changer => {
                "@NAME@_TFO_locked".to_owned()
            }

            (EquipmentType::Generator, Port::UPu) => "@NAME@_Upu_value".to_owned(),
            (EquipmentType::Generator, Port::SwitchOffSignal2) => {
                "@NAME@_switchOffSignal2".to_owned()
            }
            (EquipmentType::Generator | EquipmentType::Load, Port::State) => {
                "@NAME@_state".to_owned()
            }
            _ => return None,
        };
        Some(var)
    }
}

/// Memoized default models, one instance per `(type, static id)`.
///
/// Scoped to a single assembly; not shared across threads.
#[derive(Debug)]
pub struct DefaultModelsHandler<'n> {
    network: &'n Network,
    cache: RefCell<IndexMap<(EquipmentType, String), Arc<BlackBoxModel>>>,
}

impl<'n> DefaultModelsHandler<'n> {
    pub fn new(network: &'n Network) -> Self {
        Self {
            network,
            cache: RefCell::new(IndexMap::new()),
        }
    }

    /// Fails with [`DynamicsError::DefaultModelNotImplemented`] for equipment
    /// types without a network default.
    pub fn default_model(
        &self,
        static_id: &str,
        equipment_type: EquipmentType,
    ) -> Result<Arc<BlackBoxModel>> {
        let key = (equipment_type, static_id.to_owned());
        if let Some(model) = self.cache.borrow().get(&key) {
            return Ok(Arc::clone(model));
        }

        let lib = NetworkEquipment::lib(equipment_type).ok_or_else(|| {
            DynamicsError::DefaultModelNotImplemented {
                equipment_type,
                static_id: static_id.to_owned(),
            }
        })?;
        let tap_changer = self
            .network
            .transformer(static_id)
            .map(|transformer| transformer.tap_changer)
            .unwrap_or(false);
        let model = Arc::new(BlackBoxModel::new(
            static_id,
            "",
            ModelConfig::new(lib),
            ModelVariant::NetworkDefault(NetworkEquipment {
                static_id: static_id.to_owned(),
                equipment_type,
                tap_changer,
            }),
        ));
        debug!(static_id, lib, "default model created");
        self.cache.borrow_mut().insert(key, Arc::clone(&model));
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    /// Snapshot of every default created so far, in creation order.
    pub fn models(&self) -> Vec<Arc<BlackBoxModel>> {
        self.cache.borrow().values().cloned().collect()
    }
}
