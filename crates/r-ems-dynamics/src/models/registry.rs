//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Per-run lookup from equipment and dynamic ids to models.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::Result;
use crate::models::defaults::DefaultModelsHandler;
use crate::models::BlackBoxModel;
use crate::network::{EquipmentType, Network};

pub struct ModelRegistry<'n> {
    network: &'n Network,
    by_static_id: IndexMap<String, Arc<BlackBoxModel>>,
    by_dynamic_id: IndexMap<String, Arc<BlackBoxModel>>,
    defaults: DefaultModelsHandler<'n>,
    unconnected: HashSet<String>,
}

impl<'n> ModelRegistry<'n> {
    /// Callers guarantee unique dynamic ids and at most one model per static id.
    pub fn new(network: &'n Network, models: &[Arc<BlackBoxModel>]) -> Self {
        let mut by_static_id = IndexMap::new();
        let mut by_dynamic_id = IndexMap::new();
        for model in models {
            if let Some(static_id) = model.static_id() {
                by_static_id
                    .entry(static_id.to_owned())
                    .or_insert_with(|| Arc::clone(model));
            }
            by_dynamic_id
                .entry(model.dynamic_model_id().to_owned())
                .or_insert_with(|| Arc::clone(model));
        }
        Self {
            network,
            by_static_id,
            by_dynamic_id,
            defaults: DefaultModelsHandler::new(network),
            unconnected: HashSet::new(),
        }
    }

    pub fn network(&self) -> &'n Network {
        self.network
    }

    pub fn defaults(&self) -> &DefaultModelsHandler<'n> {
        &self.defaults
    }

    /// Explicit model bound to `static_id`, else the network default when the
    /// equipment exists with the requested type, else `None`.
    pub fn resolve(
        &self,
        static_id: &str,
        equipment_type: EquipmentType,
    ) -> Result<Option<Arc<BlackBoxModel>>> {
        if let Some(model) = self.by_static_id.get(static_id) {
            return Ok(Some(Arc::clone(model)));
        }
        self.resolve_default(static_id, equipment_type)
    }

    /// Network default only, ignoring explicit models.
    pub fn resolve_default(
        &self,
        static_id: &str,
        equipment_type: EquipmentType,
    ) -> Result<Option<Arc<BlackBoxModel>>> {
        if !self.network.contains(static_id, equipment_type) {
            return Ok(None);
        }
        self.defaults
            .default_model(static_id, equipment_type)
            .map(Some)
    }

    /// Pure-dynamic model by id; unconnected models are invisible.
    pub fn dynamic_model(&self, dynamic_model_id: &str) -> Option<Arc<BlackBoxModel>> {
        if self.unconnected.contains(dynamic_model_id) {
            return None;
        }
        self.by_dynamic_id.get(dynamic_model_id).cloned()
    }

    pub fn mark_unconnected(&mut self, dynamic_model_id: &str) {
        self.unconnected.insert(dynamic_model_id.to_owned());
    }

    pub fn is_unconnected(&self, dynamic_model_id: &str) -> bool {
        self.unconnected.contains(dynamic_model_id)
    }
}
