//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Blocks tap changers when monitored bus voltages drop.
//!
//! Every target is optional. The automaton is dropped when none of its
//! blocking targets or none of its measurement points can be reached.

use tracing::debug;

use crate::error::Result;
use crate::macro_connections::{MacroConnectionsAdder, VarConnection};
use crate::models::capability::{Capability, Port, TransformerSide};
use crate::models::{BlackBoxModel, Connectivity};
use crate::network::EquipmentType;

/// Each measurement point count is a distinct engine library.
pub const MAX_MEASUREMENTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TapChangerBlockingAutomaton {
    /// Monitored bus ids, 1 to [`MAX_MEASUREMENTS`].
    pub measurement_points: Vec<String>,
    pub transformers: Vec<String>,
    pub loads: Vec<String>,
    /// Dynamic ids of tap changer automatons of the same run.
    pub tap_changers: Vec<String>,
}

impl TapChangerBlockingAutomaton {
    /// Engine library for `measurements` measurement points.
    pub fn lib_for(base_lib: &str, measurements: usize) -> String {
        format!("{base_lib}{measurements}")
    }

    pub(crate) fn create_macro_connections(
        &self,
        model: &BlackBoxModel,
        prefix: &str,
        adder: &mut MacroConnectionsAdder<'_>,
    ) -> Result<Connectivity> {
        let blocked_t = format!("{prefix}_blockedT");
        let blocked_d = format!("{prefix}_blockedD");
        let mut blocking = 0usize;

        for transformer in &self.transformers {
            let skipped = adder.create_macro_connections_or_skip(
                model,
                transformer,
                EquipmentType::TwoWindingsTransformer,
                Capability::TapChangeable,
                None,
                |target| {
                    Ok(vec![VarConnection::new(
                        blocked_t.clone(),
                        target.require_var(Port::TapLocked(TransformerSide::None))?,
                    )])
                },
            )?;
            blocking += usize::from(!skipped);
        }

        for load in &self.loads {
            let skipped = adder.create_macro_connections_or_skip(
                model,
                load,
                EquipmentType::Load,
                Capability::LoadWithTransformers,
                None,
                |target| {
                    let upstream = target.require_var(Port::TapLocked(TransformerSide::Upstream))?;
                    let downstream =
                        target.require_var(Port::TapLocked(TransformerSide::Downstream))?;
                    let mut connections = vec![VarConnection::new(blocked_t.clone(), upstream.clone())];
                    if downstream != upstream {
                        connections.push(VarConnection::new(blocked_d.clone(), downstream));
                    }
                    Ok(connections)
                },
            )?;
            blocking += usize::from(!skipped);
        }

        for tap_changer in &self.tap_changers {
            let skipped = adder.create_tca_macro_connections_or_skip(model, tap_changer, |tca| {
                Ok(vec![VarConnection::new(
                    blocked_t.clone(),
                    tca.require_var(Port::TapLocked(TransformerSide::None))?,
                )])
            })?;
            blocking += usize::from(!skipped);
        }

        if blocking == 0 {
            debug!(model = model.dynamic_model_id(), "no tap changer left to block");
            return Ok(Connectivity::Unconnected);
        }

        let mut measured = 0usize;
        for (index, bus) in self.measurement_points.iter().enumerate() {
            let position = index + 1;
            let skipped = adder.create_macro_connections_or_skip(
                model,
                bus,
                EquipmentType::Bus,
                Capability::Bus,
                Some(&format!("Measure{position}")),
                |target| {
                    Ok(vec![VarConnection::new(
                        format!("{prefix}_UMonitored{position}"),
                        target.require_var(Port::UPu)?,
                    )])
                },
            )?;
            measured += usize::from(!skipped);
        }

        if measured == 0 {
            debug!(model = model.dynamic_model_id(), "no measurement point reachable");
            return Ok(Connectivity::Unconnected);
        }
        Ok(Connectivity::Connected)
    }
}
