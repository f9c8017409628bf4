//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Current limit automatons: measure a branch current and open a branch.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::macro_connections::{MacroConnectionsAdder, VarConnection};
use crate::models::capability::{Capability, Port};
use crate::models::{BlackBoxModel, Connectivity};
use crate::network::{EquipmentType, Side};

/// Branches a current limit automaton can measure or control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadripoleType {
    Line,
    TwoWindingsTransformer,
}

impl QuadripoleType {
    pub fn from_equipment_type(equipment_type: EquipmentType) -> Option<Self> {
        match equipment_type {
            EquipmentType::Line => Some(QuadripoleType::Line),
            EquipmentType::TwoWindingsTransformer => Some(QuadripoleType::TwoWindingsTransformer),
            _ => None,
        }
    }

    pub fn equipment_type(self) -> EquipmentType {
        match self {
            QuadripoleType::Line => EquipmentType::Line,
            QuadripoleType::TwoWindingsTransformer => EquipmentType::TwoWindingsTransformer,
        }
    }

    pub fn capability(self) -> Capability {
        match self {
            QuadripoleType::Line => Capability::Line,
            QuadripoleType::TwoWindingsTransformer => Capability::Transformer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchMeasurement {
    pub id: String,
    pub kind: QuadripoleType,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quadripole {
    pub id: String,
    pub kind: QuadripoleType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentLimitAutomaton {
    pub measurement: BranchMeasurement,
    /// Opened branch; the measured one when unset.
    pub controlled: Option<Quadripole>,
}

impl CurrentLimitAutomaton {
    pub(crate) fn create_macro_connections(
        &self,
        model: &BlackBoxModel,
        prefix: &str,
        adder: &mut MacroConnectionsAdder<'_>,
    ) -> Result<Connectivity> {
        connect_measurement(model, prefix, adder, &self.measurement, "", "")?;
        let controlled = self.controlled.clone().unwrap_or_else(|| Quadripole {
            id: self.measurement.id.clone(),
            kind: self.measurement.kind,
        });
        connect_control(model, prefix, adder, &controlled)?;
        Ok(Connectivity::Connected)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentLimitTwoLevelsAutomaton {
    pub first_measurement: BranchMeasurement,
    pub second_measurement: BranchMeasurement,
    pub controlled: Quadripole,
}

impl CurrentLimitTwoLevelsAutomaton {
    pub(crate) fn create_macro_connections(
        &self,
        model: &BlackBoxModel,
        prefix: &str,
        adder: &mut MacroConnectionsAdder<'_>,
    ) -> Result<Connectivity> {
        connect_measurement(model, prefix, adder, &self.first_measurement, "1", "Measure1")?;
        connect_measurement(model, prefix, adder, &self.second_measurement, "2", "Measure2")?;
        connect_control(model, prefix, adder, &self.controlled)?;
        Ok(Connectivity::Connected)
    }
}

fn connect_measurement(
    model: &BlackBoxModel,
    prefix: &str,
    adder: &mut MacroConnectionsAdder<'_>,
    measurement: &BranchMeasurement,
    var_index: &str,
    suffix_tail: &str,
) -> Result<()> {
    let side = measurement.side;
    let suffix = format!("{}{suffix_tail}", side.suffix());
    adder.create_macro_connections_with_suffix(
        model,
        &measurement.id,
        measurement.kind.equipment_type(),
        measurement.kind.capability(),
        &suffix,
        |branch| {
            Ok(vec![
                VarConnection::new(
                    format!("{prefix}_IMonitored{var_index}"),
                    branch.require_var(Port::Current(side))?,
                ),
                VarConnection::new(
                    format!("{prefix}_AutomatonExists"),
                    branch.require_var(Port::CurrentLimitsDeactivation)?,
                ),
            ])
        },
    )
}

fn connect_control(
    model: &BlackBoxModel,
    prefix: &str,
    adder: &mut MacroConnectionsAdder<'_>,
    controlled: &Quadripole,
) -> Result<()> {
    adder.create_macro_connections(
        model,
        &controlled.id,
        controlled.kind.equipment_type(),
        controlled.kind.capability(),
        |branch| {
            Ok(vec![VarConnection::new(
                format!("{prefix}_order"),
                branch.require_var(Port::State)?,
            )])
        },
    )
}
