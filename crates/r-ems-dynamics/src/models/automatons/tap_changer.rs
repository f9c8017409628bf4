//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use crate::error::Result;
use crate::macro_connections::{MacroConnectionsAdder, VarConnection};
use crate::models::capability::{Capability, Port, TransformerSide};
use crate::models::{BlackBoxModel, Connectivity};
use crate::network::EquipmentType;

/// Drives the tap of a transformer embedded in a load model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapChangerAutomaton {
    pub load: String,
    pub side: TransformerSide,
}

impl TapChangerAutomaton {
    pub(crate) fn create_macro_connections(
        &self,
        model: &BlackBoxModel,
        prefix: &str,
        adder: &mut MacroConnectionsAdder<'_>,
    ) -> Result<Connectivity> {
        let side = self.side;
        let skipped = adder.create_macro_connections_or_skip(
            model,
            &self.load,
            EquipmentType::Load,
            Capability::LoadWithTransformers,
            None,
            |load| {
                Ok(vec![
                    VarConnection::new(
                        format!("{prefix}_tap"),
                        load.require_var(Port::TapPosition(side))?,
                    ),
                    VarConnection::new(
                        format!("{prefix}_UMonitored"),
                        load.require_var(Port::UPu)?,
                    ),
                    VarConnection::new(
                        format!("{prefix}_switchOffSignal1"),
                        load.require_var(Port::TapSwitchOffSignal(side))?,
                    ),
                ])
            },
        )?;
        Ok(if skipped {
            Connectivity::Unconnected
        } else {
            Connectivity::Connected
        })
    }
}
