//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Frequency reference aggregator linking every synchronized generator.
//!
//! Generator order is load-bearing: the position of a generator in the list
//! is both its `weight_gen_<i>` parameter index and the `index1` of its two
//! connects.

use std::sync::Arc;

use tracing::info;

use crate::error::{DynamicsError, Result};
use crate::macro_connections::{ConnectSource, MacroConnectionsAdder, VarConnection};
use crate::models::{BlackBoxModel, Capability, Port};
use crate::network::{EquipmentType, Side};
use crate::parameters::{ParameterDatabase, ParametersSet};

pub const OMEGA_REF_ID: &str = "OMEGA_REF";
pub const OMEGA_REF_LIB: &str = "DYNModelOmegaRef";
pub const OMEGA_REF_PAR_ID: &str = "OMEGA_REF";

#[derive(Debug, Default)]
pub struct OmegaRef {
    generators: Vec<Arc<BlackBoxModel>>,
}

impl OmegaRef {
    /// Keeps the generators needing synchronization, in the given order.
    pub fn new<'m>(models: impl IntoIterator<Item = &'m Arc<BlackBoxModel>>) -> Self {
        Self {
            generators: models
                .into_iter()
                .filter(|model| model.has(Capability::SynchronizedGenerator))
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn generators(&self) -> &[Arc<BlackBoxModel>] {
        &self.generators
    }

    pub fn create_macro_connections(&self, adder: &mut MacroConnectionsAdder<'_>) -> Result<()> {
        for (index, generator) in self.generators.iter().enumerate() {
            let source = ConnectSource {
                id: OMEGA_REF_ID,
                lib: OMEGA_REF_LIB,
                index: Some(index),
            };
            adder.create_indexed_macro_connections(source, generator, |generator| {
                generator.omega_ref_connections()
            })?;

            let static_id = generator.static_id().unwrap_or_default();
            let bus = adder
                .network()
                .connectable_bus(static_id, Side::One)
                .ok_or_else(|| DynamicsError::GeneratorNotRegistered(static_id.to_owned()))?;
            adder.create_indexed_macro_connections_to(
                source,
                &bus,
                EquipmentType::Bus,
                Capability::Bus,
                |bus_model| {
                    Ok(vec![VarConnection::new(
                        "numcc_node_@INDEX@",
                        bus_model.require_var(Port::Numcc)?,
                    )])
                },
            )?;
        }
        info!(generators = self.generators.len(), "omega ref connected");
        Ok(())
    }

    /// `nbGen` plus one `weight_gen_<i>` = H × SNom per generator, in list order.
    pub fn parameters(&self, database: &dyn ParameterDatabase) -> Result<ParametersSet> {
        let mut set = ParametersSet::new(OMEGA_REF_PAR_ID);
        set.add_int("nbGen", self.generators.len() as i64);
        for (index, generator) in self.generators.iter().enumerate() {
            let prefix = generator.prefix();
            let par_id = generator.parameter_set_id();
            let h = database.double(par_id, &format!("{prefix}_H"))?;
            let s_nom = database.double(par_id, &format!("{prefix}_SNom"))?;
            set.add_double(format!("weight_gen_{index}"), h * s_nom);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::equipment::{EquipmentFamily, EquipmentModel, GeneratorKind, LoadKind};
    use crate::models::{ModelConfig, ModelVariant};
    use crate::parameters::ParametersDatabase;

    fn generator(id: &str, par: &str, kind: GeneratorKind) -> Arc<BlackBoxModel> {
        Arc::new(BlackBoxModel::new(
            id,
            par,
            ModelConfig::new("GeneratorSynchronousFourWindings"),
            ModelVariant::Equipment(EquipmentModel::new(
                id,
                EquipmentFamily::Generator(kind),
                vec!["B1".into()],
            )),
        ))
    }

    #[test]
    fn weights_follow_declaration_order() {
        let mut g2 = ParametersSet::new("G2_PAR");
        g2.add_double("generator_H", 2.0);
        g2.add_double("generator_SNom", 100.0);
        let mut g1 = ParametersSet::new("G1_PAR");
        g1.add_double("generator_H", 5.0);
        g1.add_double("generator_SNom", 10.0);
        let database: ParametersDatabase = [g1, g2].into_iter().collect();

        let models = vec![
            generator("G2", "G2_PAR", GeneratorKind::Synchronous),
            Arc::new(BlackBoxModel::new(
                "LD1",
                "LOAD",
                ModelConfig::new("LoadAlphaBeta"),
                ModelVariant::Equipment(EquipmentModel::new(
                    "LD1",
                    EquipmentFamily::Load(LoadKind::Base),
                    vec!["B1".into()],
                )),
            )),
            generator("G1", "G1_PAR", GeneratorKind::Synchronized),
            generator("G3", "G3_PAR", GeneratorKind::Fictitious),
        ];
        let omega_ref = OmegaRef::new(&models);
        assert_eq!(omega_ref.generators().len(), 2);

        let set = omega_ref.parameters(&database).unwrap();
        assert_eq!(set.get("nbGen").map(|p| p.value.as_str()), Some("2"));
        assert_eq!(set.double("weight_gen_0").unwrap(), 200.0);
        assert_eq!(set.double("weight_gen_1").unwrap(), 50.0);
    }

    #[test]
    fn missing_inertia_is_an_error() {
        let models = vec![generator("G1", "G1_PAR", GeneratorKind::Synchronous)];
        let omega_ref = OmegaRef::new(&models);
        let err = omega_ref.parameters(&ParametersDatabase::new()).unwrap_err();
        assert!(matches!(err, DynamicsError::UnknownParameterSet(set) if set == "G1_PAR"));
    }
}
