//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Assembly of one simulation preparation pass.
//!
//! Models are connected in two phases: every model except tap changer
//! blocking automatons first, then those, so that blocking automatons only
//! see tap changer automatons that did connect. Each model stages its own
//! output; staged output is committed in declaration order with OmegaRef
//! last, which keeps the result independent of the phase split.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use r_ems_logging::{ems_warn, log_stage_event, LogContext, StageOutcome};
use serde::Serialize;
use tracing::info;

use crate::error::{DynamicsError, Result};
use crate::macro_connections::{
    merge_connector, MacroConnect, MacroConnectionsAdder, MacroConnector, MacroStaticReference,
    StagedConnections,
};
use crate::models::omega_ref::{OmegaRef, OMEGA_REF_ID, OMEGA_REF_LIB, OMEGA_REF_PAR_ID};
use crate::models::{BlackBoxModel, Connectivity, ModelRegistry};
use crate::network::Network;
use crate::parameters::{ParameterDatabase, ParametersSet};
use crate::report::{ReportNode, Severity};

/// Parameter file names written into black-box model declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyOptions {
    pub models_par_file: String,
    pub omega_ref_par_file: String,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            models_par_file: "models.par".to_owned(),
            omega_ref_par_file: "omega_ref.par".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlackBoxModelEntry {
    pub id: String,
    pub lib: String,
    pub par_file: String,
    pub par_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_id: Option<String>,
    /// Id of the macro static reference, when the model has a variable mapping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macro_static_ref: Option<String>,
}

/// Everything the dynamic models file and the OmegaRef parameter file need.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelsArchitecture {
    pub black_box_models: Vec<BlackBoxModelEntry>,
    pub macro_connectors: Vec<MacroConnector>,
    pub macro_connects: Vec<MacroConnect>,
    pub macro_static_references: Vec<MacroStaticReference>,
    #[serde(skip)]
    pub omega_ref_parameters: Option<ParametersSet>,
    /// Dynamic ids of models dropped because nothing they need could be reached.
    pub unconnected_models: Vec<String>,
}

impl ModelsArchitecture {
    pub fn connects_with(&self, connector: &str) -> impl Iterator<Item = &MacroConnect> {
        let connector = connector.to_owned();
        self.macro_connects
            .iter()
            .filter(move |connect| connect.connector == connector)
    }

    pub fn contains_model(&self, id: &str) -> bool {
        self.black_box_models.iter().any(|entry| entry.id == id)
    }
}

pub struct DynamicsContext<'a> {
    network: &'a Network,
    models: Vec<Arc<BlackBoxModel>>,
    parameters: &'a dyn ParameterDatabase,
    options: AssemblyOptions,
    report: &'a mut ReportNode,
    default_models: Vec<Arc<BlackBoxModel>>,
}

impl<'a> DynamicsContext<'a> {
    /// Fails on duplicate dynamic ids, [`OMEGA_REF_ID`] being reserved. A
    /// second model bound to an already bound static id is reported and ignored.
    pub fn new(
        network: &'a Network,
        models: Vec<BlackBoxModel>,
        parameters: &'a dyn ParameterDatabase,
        options: AssemblyOptions,
        report: &'a mut ReportNode,
    ) -> Result<Self> {
        let mut dynamic_ids = HashSet::from([OMEGA_REF_ID.to_owned()]);
        let mut static_ids = HashSet::new();
        let mut kept = Vec::with_capacity(models.len());
        for model in models {
            if !dynamic_ids.insert(model.dynamic_model_id().to_owned()) {
                return Err(DynamicsError::DuplicateDynamicModelId(
                    model.dynamic_model_id().to_owned(),
                ));
            }
            if let Some(static_id) = model.static_id() {
                if !static_ids.insert(static_id.to_owned()) {
                    report.report(
                        "duplicateStaticId",
                        format!(
                            "Duplicate static id found: {static_id} -> dynamic model {} {} ignored",
                            model.lib(),
                            model.dynamic_model_id()
                        ),
                        Severity::Warn,
                    );
                    continue;
                }
            }
            kept.push(Arc::new(model));
        }
        Ok(Self {
            network,
            models: kept,
            parameters,
            options,
            report,
            default_models: Vec::new(),
        })
    }

    pub fn models(&self) -> &[Arc<BlackBoxModel>] {
        &self.models
    }

    /// Network defaults created by the last [`Self::assemble`] call, in creation order.
    pub fn default_models(&self) -> &[Arc<BlackBoxModel>] {
        &self.default_models
    }

    pub fn assemble(&mut self) -> Result<ModelsArchitecture> {
        let mut registry = ModelRegistry::new(self.network, &self.models);
        let mut staged: Vec<Option<StagedConnections>> = vec![None; self.models.len()];
        let mut unconnected = Vec::new();

        for connects_last in [false, true] {
            for (position, model) in self.models.iter().enumerate() {
                if model.connects_last() != connects_last {
                    continue;
                }
                let (connectivity, output) = {
                    let mut adder = MacroConnectionsAdder::new(&registry, self.report);
                    let connectivity = model.create_macro_connections(&mut adder)?;
                    (connectivity, adder.into_staged())
                };
                match connectivity {
                    Connectivity::Connected => staged[position] = Some(output),
                    Connectivity::Unconnected => {
                        ems_warn!(
                            context = LogContext::new()
                                .with_run(&self.network.id)
                                .with_model(model.dynamic_model_id())
                                .with_lib(model.lib()),
                            "model dropped, no connection target reachable"
                        );
                        self.report.report(
                            "modelUnconnected",
                            format!(
                                "{} ({}) has no reachable connection target and is dropped",
                                model.dynamic_model_id(),
                                model.lib()
                            ),
                            Severity::Warn,
                        );
                        registry.mark_unconnected(model.dynamic_model_id());
                        unconnected.push(model.dynamic_model_id().to_owned());
                    }
                }
            }
        }

        let connected: Vec<Arc<BlackBoxModel>> = self
            .models
            .iter()
            .filter(|model| !registry.is_unconnected(model.dynamic_model_id()))
            .cloned()
            .collect();
        let omega_ref = OmegaRef::new(&connected);
        let omega_ref_staged = if omega_ref.is_empty() {
            None
        } else {
            let mut adder = MacroConnectionsAdder::new(&registry, self.report);
            omega_ref.create_macro_connections(&mut adder)?;
            Some(adder.into_staged())
        };

        let mut architecture = ModelsArchitecture {
            unconnected_models: unconnected,
            ..ModelsArchitecture::default()
        };
        let mut connectors: IndexMap<String, MacroConnector> = IndexMap::new();
        let mut static_references: IndexMap<String, MacroStaticReference> = IndexMap::new();

        for (model, output) in self.models.iter().zip(staged) {
            let Some(output) = output else { continue };
            let static_reference = MacroStaticReference::of(model);
            architecture.black_box_models.push(BlackBoxModelEntry {
                id: model.dynamic_model_id().to_owned(),
                lib: model.lib().to_owned(),
                par_file: self.options.models_par_file.clone(),
                par_id: model.parameter_set_id().to_owned(),
                static_id: model.static_id().map(str::to_owned),
                macro_static_ref: static_reference.as_ref().map(|reference| reference.id.clone()),
            });
            if let Some(reference) = static_reference {
                static_references.entry(reference.id.clone()).or_insert(reference);
            }
            commit(&mut connectors, &mut architecture.macro_connects, output)?;
        }

        if let Some(output) = omega_ref_staged {
            architecture.black_box_models.push(BlackBoxModelEntry {
                id: OMEGA_REF_ID.to_owned(),
                lib: OMEGA_REF_LIB.to_owned(),
                par_file: self.options.omega_ref_par_file.clone(),
                par_id: OMEGA_REF_PAR_ID.to_owned(),
                static_id: None,
                macro_static_ref: None,
            });
            commit(&mut connectors, &mut architecture.macro_connects, output)?;
            architecture.omega_ref_parameters = Some(omega_ref.parameters(self.parameters)?);
        }

        architecture.macro_connectors = connectors.into_values().collect();
        architecture.macro_static_references = static_references.into_values().collect();

        let run = LogContext::new().with_run(&self.network.id);
        if architecture.unconnected_models.is_empty() {
            log_stage_event(Some(&run), "assembly", "all models connected", StageOutcome::Success);
        } else {
            log_stage_event(
                Some(&run),
                "assembly",
                &format!("{} models dropped", architecture.unconnected_models.len()),
                StageOutcome::Degraded,
            );
        }
        info!(
            network = %self.network.id,
            models = architecture.black_box_models.len(),
            connectors = architecture.macro_connectors.len(),
            connects = architecture.macro_connects.len(),
            defaults = registry.defaults().len(),
            "dynamic models architecture assembled"
        );
        self.default_models = registry.defaults().models();
        self.report.report(
            "architectureAssembled",
            format!(
                "{} black box models, {} macro connectors, {} macro connects",
                architecture.black_box_models.len(),
                architecture.macro_connectors.len(),
                architecture.macro_connects.len()
            ),
            Severity::Info,
        );
        Ok(architecture)
    }
}

fn commit(
    connectors: &mut IndexMap<String, MacroConnector>,
    connects: &mut Vec<MacroConnect>,
    output: StagedConnections,
) -> Result<()> {
    for connector in output.connectors.into_values() {
        merge_connector(connectors, connector)?;
    }
    connects.extend(output.connects);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::EquipmentModelBuilder;
    use crate::models::ModelCatalog;
    use crate::parameters::ParametersDatabase;

    fn load(network: &Network, dynamic_id: &str, report: &mut ReportNode) -> BlackBoxModel {
        EquipmentModelBuilder::of(network, ModelCatalog::bundled(), "LoadAlphaBeta")
            .static_id("LD1")
            .dynamic_model_id(dynamic_id)
            .parameter_set_id("LAB")
            .build(report)
            .unwrap()
    }

    #[test]
    fn second_model_on_a_static_id_is_ignored() {
        let network = Network::new("n").with_bus("B1").with_load("LD1", "B1");
        let mut report = ReportNode::new_root("run", "run");
        let models = vec![load(&network, "LD1_A", &mut report), load(&network, "LD1_B", &mut report)];
        let parameters = ParametersDatabase::new();
        let mut context = DynamicsContext::new(
            &network,
            models,
            &parameters,
            AssemblyOptions::default(),
            &mut report,
        )
        .unwrap();
        assert_eq!(context.models().len(), 1);

        let architecture = context.assemble().unwrap();
        assert_eq!(architecture.black_box_models.len(), 1);
        assert_eq!(architecture.black_box_models[0].id, "LD1_A");
        assert_eq!(
            architecture.black_box_models[0].macro_static_ref.as_deref(),
            Some("MSR_LoadAlphaBeta")
        );
        assert!(architecture.omega_ref_parameters.is_none());
        assert_eq!(report.entries_with_key("duplicateStaticId").len(), 1);
        assert_eq!(report.entries_with_key("architectureAssembled").len(), 1);
    }

    #[test]
    fn omega_ref_id_is_reserved() {
        let network = Network::new("n").with_bus("B1").with_generator("G1", "B1");
        let mut report = ReportNode::new_root("run", "run");
        let generator = EquipmentModelBuilder::of(&network, ModelCatalog::bundled(), "GeneratorPV")
            .static_id("G1")
            .dynamic_model_id(OMEGA_REF_ID)
            .parameter_set_id("GPV")
            .build(&mut report)
            .unwrap();
        let parameters = ParametersDatabase::new();
        let err = DynamicsContext::new(
            &network,
            vec![generator],
            &parameters,
            AssemblyOptions::default(),
            &mut report,
        )
        .err()
        .unwrap();
        assert!(matches!(err, DynamicsError::DuplicateDynamicModelId(id) if id == OMEGA_REF_ID));
    }

    #[test]
    fn parameter_files_come_from_options() {
        let network = Network::new("n")
            .with_bus("B1")
            .with_generator("G1", "B1")
            .with_load("LD1", "B1");
        let mut report = ReportNode::new_root("run", "run");
        let generator = EquipmentModelBuilder::of(&network, ModelCatalog::bundled(), "GeneratorPV")
            .static_id("G1")
            .parameter_set_id("GPV")
            .build(&mut report)
            .unwrap();
        let mut set = ParametersSet::new("GPV");
        set.add_double("generator_H", 3.0);
        set.add_double("generator_SNom", 50.0);
        let parameters: ParametersDatabase = [set].into_iter().collect();
        let options = AssemblyOptions {
            models_par_file: "grid.par".into(),
            omega_ref_par_file: "grid_omega.par".into(),
        };
        let mut context =
            DynamicsContext::new(&network, vec![generator], &parameters, options, &mut report).unwrap();
        let architecture = context.assemble().unwrap();

        let files: Vec<(&str, &str)> = architecture
            .black_box_models
            .iter()
            .map(|entry| (entry.id.as_str(), entry.par_file.as_str()))
            .collect();
        assert_eq!(files, [("G1", "grid.par"), ("OMEGA_REF", "grid_omega.par")]);
    }
}
