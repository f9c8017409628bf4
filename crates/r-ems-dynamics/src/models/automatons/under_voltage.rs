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
use crate::models::capability::{Capability, Port};
use crate::models::{BlackBoxModel, Connectivity};
use crate::network::EquipmentType;

/// Trips a generator when its terminal voltage stays too low.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnderVoltageAutomaton {
    pub generator: String,
}

impl UnderVoltageAutomaton {
    pub(crate) fn create_macro_connections(
        &self,
        model: &BlackBoxModel,
        prefix: &str,
        adder: &mut MacroConnectionsAdder<'_>,
    ) -> Result<Connectivity> {
        adder.create_macro_connections(
            model,
            &self.generator,
            EquipmentType::Generator,
            Capability::Generator,
            |generator| {
                Ok(vec![
                    VarConnection::new(
                        format!("{prefix}_UMonitoredPu"),
                        generator.require_var(Port::UPu)?,
                    ),
                    VarConnection::new(
                        format!("{prefix}_switchOffSignal"),
                        generator.require_var(Port::SwitchOffSignal2)?,
                    ),
                ])
            },
        )?;
        Ok(Connectivity::Connected)
    }
}
