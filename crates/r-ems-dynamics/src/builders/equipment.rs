//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use crate::builders::{BuildFailure, BuilderCore};
use crate::models::{
    BlackBoxModel, EquipmentFamily, EquipmentModel, ModelCatalog, ModelCategory, ModelVariant,
};
use crate::network::Network;
use crate::report::ReportNode;

/// Builds a model bound to a bus, branch, generator or load.
///
/// The library decides the equipment family; the dynamic model id defaults to
/// the static id.
#[derive(Debug)]
pub struct EquipmentModelBuilder<'a> {
    core: BuilderCore<'a>,
    static_id: Option<String>,
}

impl<'a> EquipmentModelBuilder<'a> {
    pub fn of(network: &'a Network, catalog: &ModelCatalog, lib: &str) -> Self {
        Self {
            core: BuilderCore::new(network, catalog, &ModelCategory::EQUIPMENTS, lib),
            static_id: None,
        }
    }

    pub fn static_id(mut self, static_id: impl Into<String>) -> Self {
        self.static_id = Some(static_id.into());
        self
    }

    pub fn dynamic_model_id(mut self, dynamic_model_id: impl Into<String>) -> Self {
        self.core.dynamic_model_id = Some(dynamic_model_id.into());
        self
    }

    pub fn parameter_set_id(mut self, parameter_set_id: impl Into<String>) -> Self {
        self.core.parameter_set_id = Some(parameter_set_id.into());
        self
    }

    pub fn build(mut self, report: &mut ReportNode) -> Result<BlackBoxModel, BuildFailure> {
        let config = self.core.config();
        let family = config
            .as_ref()
            .and_then(|(category, _)| EquipmentFamily::from_category(*category));
        let static_id = match family {
            Some(family) => self
                .core
                .require_equipment("staticId", self.static_id.clone(), &[family.equipment_type()])
                .map(|(id, _)| id),
            None => self.core.require("staticId", self.static_id.clone()),
        };
        let parameter_set_id = self
            .core
            .require("parameterSetId", self.core.parameter_set_id.clone());
        let dynamic_model_id = self.core.dynamic_model_id.clone().or_else(|| static_id.clone());

        let built = match (config, family, static_id, parameter_set_id, &dynamic_model_id) {
            (Some((_, config)), Some(family), Some(static_id), Some(parameter_set_id), Some(id)) => {
                let buses = self.core.network.connectable_buses(&static_id);
                Some(BlackBoxModel::new(
                    id.clone(),
                    parameter_set_id,
                    config,
                    ModelVariant::Equipment(EquipmentModel::new(static_id, family, buses)),
                ))
            }
            _ => None,
        };
        self.core.finish(report, dynamic_model_id.as_deref(), built)
    }
}
