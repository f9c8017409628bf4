//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Pure-dynamic protection and control models.

pub mod current_limit;
pub mod tap_changer;
pub mod tap_changer_blocking;
pub mod under_voltage;

use crate::error::Result;
use crate::macro_connections::MacroConnectionsAdder;
use crate::models::capability::{Capability, CapabilitySet, Port};
use crate::models::{BlackBoxModel, Connectivity};

pub use current_limit::{
    BranchMeasurement, CurrentLimitAutomaton, CurrentLimitTwoLevelsAutomaton, Quadripole,
    QuadripoleType,
};
pub use tap_changer::TapChangerAutomaton;
pub use tap_changer_blocking::{TapChangerBlockingAutomaton, MAX_MEASUREMENTS};
pub use under_voltage::UnderVoltageAutomaton;

#[derive(Debug, Clone, PartialEq)]
pub enum Automaton {
    CurrentLimit(CurrentLimitAutomaton),
    CurrentLimitTwoLevels(CurrentLimitTwoLevelsAutomaton),
    TapChanger(TapChangerAutomaton),
    TapChangerBlocking(TapChangerBlockingAutomaton),
    UnderVoltage(UnderVoltageAutomaton),
}

impl Automaton {
    pub(crate) fn capabilities(&self) -> CapabilitySet {
        match self {
            Automaton::TapChanger(_) => {
                CapabilitySet::empty().with(Capability::TapChangerAutomaton)
            }
            _ => CapabilitySet::empty(),
        }
    }

    pub(crate) fn default_prefix(&self) -> &'static str {
        match self {
            Automaton::CurrentLimit(_) | Automaton::CurrentLimitTwoLevels(_) => {
                "currentLimitAutomaton"
            }
            Automaton::TapChanger(_) => "tapChanger",
            Automaton::TapChangerBlocking(_) => "tapChangerBlocking",
            Automaton::UnderVoltage(_) => "underVoltageAutomaton",
        }
    }

    pub(crate) fn var(&self, prefix: &str, port: Port) -> Option<String> {
        match (self, port) {
            (Automaton::TapChanger(_), Port::TapLocked(_)) => Some(format!("{prefix}_locked")),
            _ => None,
        }
    }

    pub(crate) fn create_macro_connections(
        &self,
        model: &BlackBoxModel,
        adder: &mut MacroConnectionsAdder<'_>,
    ) -> Result<Connectivity> {
        let prefix = model.prefix();
        match self {
            Automaton::CurrentLimit(automaton) => {
                automaton.create_macro_connections(model, prefix, adder)
            }
            Automaton::CurrentLimitTwoLevels(automaton) => {
                automaton.create_macro_connections(model, prefix, adder)
            }
            Automaton::TapChanger(automaton) => {
                automaton.create_macro_connections(model, prefix, adder)
            }
            Automaton::TapChangerBlocking(automaton) => {
                automaton.create_macro_connections(model, prefix, adder)
            }
            Automaton::UnderVoltage(automaton) => {
                automaton.create_macro_connections(model, prefix, adder)
            }
        }
    }
}
