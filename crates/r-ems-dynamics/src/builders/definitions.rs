//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Declarative model definitions, as supplied by JSON or YAML files.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::builders::{
    CurrentLimitAutomatonBuilder, CurrentLimitTwoLevelsAutomatonBuilder, EquipmentModelBuilder,
    TapChangerAutomatonBuilder, TapChangerBlockingAutomatonBuilder, UnderVoltageAutomatonBuilder,
};
use crate::error::Result;
use crate::models::{BlackBoxModel, ModelCatalog, TransformerSide};
use crate::network::{Network, Side};
use crate::report::ReportNode;

/// One requested model. Every field but `lib` is optional so that missing
/// values surface as builder diagnostics rather than parse errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ModelDefinition {
    #[serde(rename_all = "camelCase")]
    Equipment {
        lib: String,
        static_id: Option<String>,
        dynamic_model_id: Option<String>,
        parameter_set_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    CurrentLimitAutomaton {
        lib: String,
        dynamic_model_id: Option<String>,
        parameter_set_id: Option<String>,
        i_measurement: Option<String>,
        i_measurement_side: Option<Side>,
        controlled_quadripole: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    CurrentLimitTwoLevelsAutomaton {
        lib: String,
        dynamic_model_id: Option<String>,
        parameter_set_id: Option<String>,
        i_measurement1: Option<String>,
        i_measurement1_side: Option<Side>,
        i_measurement2: Option<String>,
        i_measurement2_side: Option<Side>,
        controlled_quadripole: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    TapChangerAutomaton {
        lib: String,
        dynamic_model_id: Option<String>,
        parameter_set_id: Option<String>,
        static_id: Option<String>,
        #[serde(default)]
        side: TransformerSide,
    },
    #[serde(rename_all = "camelCase")]
    TapChangerBlockingAutomaton {
        lib: String,
        dynamic_model_id: Option<String>,
        parameter_set_id: Option<String>,
        u_measurements: Option<Vec<String>>,
        transformers: Option<Vec<String>>,
    },
    #[serde(rename_all = "camelCase")]
    UnderVoltageAutomaton {
        lib: String,
        dynamic_model_id: Option<String>,
        parameter_set_id: Option<String>,
        generator: Option<String>,
    },
}

impl ModelDefinition {
    fn tap_changer_id(&self) -> Option<&str> {
        match self {
            ModelDefinition::TapChangerAutomaton {
                dynamic_model_id, ..
            } => dynamic_model_id.as_deref(),
            _ => None,
        }
    }
}

pub fn load_definitions_from_file(path: impl AsRef<Path>) -> Result<Vec<ModelDefinition>> {
    let data = fs::read_to_string(path)?;
    if data.trim_start().starts_with('[') {
        Ok(serde_json::from_str(&data)?)
    } else {
        Ok(serde_yaml::from_str(&data)?)
    }
}

macro_rules! apply {
    ($builder:expr, $($setter:ident = $value:expr),* $(,)?) => {{
        let mut builder = $builder;
        $(
            if let Some(value) = $value {
                builder = builder.$setter(value);
            }
        )*
        builder
    }};
}

/// Build every definition; failed ones are reported and skipped.
pub fn build_models(
    definitions: &[ModelDefinition],
    network: &Network,
    catalog: &ModelCatalog,
    report: &mut ReportNode,
) -> Vec<BlackBoxModel> {
    let known_tap_changers: Vec<&str> = definitions
        .iter()
        .filter_map(ModelDefinition::tap_changer_id)
        .collect();
    let section = report.add_child("modelBuilders", "Dynamic model builders");

    let mut models = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let built = match definition.clone() {
            ModelDefinition::Equipment {
                lib,
                static_id,
                dynamic_model_id,
                parameter_set_id,
            } => apply!(
                EquipmentModelBuilder::of(network, catalog, &lib),
                static_id = static_id,
                dynamic_model_id = dynamic_model_id,
                parameter_set_id = parameter_set_id,
            )
            .build(section),
            ModelDefinition::CurrentLimitAutomaton {
                lib,
                dynamic_model_id,
                parameter_set_id,
                i_measurement,
                i_measurement_side,
                controlled_quadripole,
            } => apply!(
                CurrentLimitAutomatonBuilder::of(network, catalog, &lib),
                dynamic_model_id = dynamic_model_id,
                parameter_set_id = parameter_set_id,
                i_measurement = i_measurement,
                i_measurement_side = i_measurement_side,
                controlled_quadripole = controlled_quadripole,
            )
            .build(section),
            ModelDefinition::CurrentLimitTwoLevelsAutomaton {
                lib,
                dynamic_model_id,
                parameter_set_id,
                i_measurement1,
                i_measurement1_side,
                i_measurement2,
                i_measurement2_side,
                controlled_quadripole,
            } => apply!(
                CurrentLimitTwoLevelsAutomatonBuilder::of(network, catalog, &lib),
                dynamic_model_id = dynamic_model_id,
                parameter_set_id = parameter_set_id,
                i_measurement1 = i_measurement1,
                i_measurement1_side = i_measurement1_side,
                i_measurement2 = i_measurement2,
                i_measurement2_side = i_measurement2_side,
                controlled_quadripole = controlled_quadripole,
            )
            .build(section),
            ModelDefinition::TapChangerAutomaton {
                lib,
                dynamic_model_id,
                parameter_set_id,
                static_id,
                side,
            } => apply!(
                TapChangerAutomatonBuilder::of(network, catalog, &lib).side(side),
                dynamic_model_id = dynamic_model_id,
                parameter_set_id = parameter_set_id,
                static_id = static_id,
            )
            .build(section),
            ModelDefinition::TapChangerBlockingAutomaton {
                lib,
                dynamic_model_id,
                parameter_set_id,
                u_measurements,
                transformers,
            } => apply!(
                TapChangerBlockingAutomatonBuilder::of(network, catalog, &lib)
                    .known_tap_changers(known_tap_changers.iter().copied()),
                dynamic_model_id = dynamic_model_id,
                parameter_set_id = parameter_set_id,
                u_measurements = u_measurements,
                transformers = transformers,
            )
            .build(section),
            ModelDefinition::UnderVoltageAutomaton {
                lib,
                dynamic_model_id,
                parameter_set_id,
                generator,
            } => apply!(
                UnderVoltageAutomatonBuilder::of(network, catalog, &lib),
                dynamic_model_id = dynamic_model_id,
                parameter_set_id = parameter_set_id,
                generator = generator,
            )
            .build(section),
        };
        match built {
            Ok(model) => models.push(model),
            Err(failure) => warn!(model = %failure.name, lib = %failure.lib, "{failure}"),
        }
    }
    info!(
        requested = definitions.len(),
        built = models.len(),
        "dynamic models built"
    );
    models
}
