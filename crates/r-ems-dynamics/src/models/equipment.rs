//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Models bound to a network equipment.

use crate::error::Result;
use crate::macro_connections::{MacroConnectionsAdder, VarConnection, VarMapping};
use crate::models::capability::{Capability, CapabilitySet, Port, TransformerSide};
use crate::models::catalog::ModelCategory;
use crate::models::{BlackBoxModel, Connectivity};
use crate::network::{EquipmentType, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    /// Full machine model: exposes its own rotor speed.
    Synchronous,
    /// Injection following the shared frequency reference.
    Synchronized,
    Fictitious,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadKind {
    Base,
    OneTransformer,
    TwoTransformers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentFamily {
    Bus,
    Line,
    Transformer,
    Generator(GeneratorKind),
    Load(LoadKind),
}

impl EquipmentFamily {
    pub fn from_category(category: ModelCategory) -> Option<Self> {
        let family = match category {
            ModelCategory::Buses => EquipmentFamily::Bus,
            ModelCategory::Lines => EquipmentFamily::Line,
            ModelCategory::Transformers => EquipmentFamily::Transformer,
            ModelCategory::SynchronousGenerators => {
                EquipmentFamily::Generator(GeneratorKind::Synchronous)
            }
            ModelCategory::SynchronizedGenerators => {
                EquipmentFamily::Generator(GeneratorKind::Synchronized)
            }
            ModelCategory::FictitiousGenerators => {
                EquipmentFamily::Generator(GeneratorKind::Fictitious)
            }
            ModelCategory::BaseLoads => EquipmentFamily::Load(LoadKind::Base),
            ModelCategory::LoadsOneTransformer => EquipmentFamily::Load(LoadKind::OneTransformer),
            ModelCategory::LoadsTwoTransformers => {
                EquipmentFamily::Load(LoadKind::TwoTransformers)
            }
            _ => return None,
        };
        Some(family)
    }

    /// Network equipment type the family can be bound to.
    pub fn equipment_type(self) -> EquipmentType {
        match self {
            EquipmentFamily::Bus => EquipmentType::Bus,
            EquipmentFamily::Line => EquipmentType::Line,
            EquipmentFamily::Transformer => EquipmentType::TwoWindingsTransformer,
            EquipmentFamily::Generator(_) => EquipmentType::Generator,
            EquipmentFamily::Load(_) => EquipmentType::Load,
        }
    }

    pub fn default_prefix(self) -> &'static str {
        match self {
            EquipmentFamily::Bus => "bus",
            EquipmentFamily::Line => "line",
            EquipmentFamily::Transformer => "transformer",
            EquipmentFamily::Generator(_) => "generator",
            EquipmentFamily::Load(_) => "load",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentModel {
    pub static_id: String,
    pub family: EquipmentFamily,
    /// Buses the equipment is attached to, ordered by side.
    pub buses: Vec<String>,
}

impl EquipmentModel {
    pub fn new(static_id: impl Into<String>, family: EquipmentFamily, buses: Vec<String>) -> Self {
        Self {
            static_id: static_id.into(),
            family,
            buses,
        }
    }

    pub(crate) fn capabilities(&self) -> CapabilitySet {
        let set = CapabilitySet::empty();
        match self.family {
            EquipmentFamily::Bus => set.with(Capability::Bus),
            EquipmentFamily::Line => set.with(Capability::Line),
            EquipmentFamily::Transformer => set.with(Capability::Transformer),
            EquipmentFamily::Generator(GeneratorKind::Fictitious) => {
                set.with(Capability::Generator)
            }
            EquipmentFamily::Generator(_) => set
                .with(Capability::Generator)
                .with(Capability::SynchronizedGenerator),
            EquipmentFamily::Load(LoadKind::Base) => set.with(Capability::Load),
            EquipmentFamily::Load(_) => set
                .with(Capability::Load)
                .with(Capability::LoadWithTransformers),
        }
    }

    pub(crate) fn var(&self, prefix: &str, port: Port) -> Option<String> {
        let name = match (self.family, port) {
            (EquipmentFamily::Bus, Port::Terminal) => "terminal".to_owned(),
            (EquipmentFamily::Bus, Port::Numcc) => "numcc".to_owned(),
            (EquipmentFamily::Bus, Port::UPu) => "UPu".to_owned(),

            (EquipmentFamily::Line | EquipmentFamily::Transformer, Port::BranchTerminal(side)) => {
                format!("terminal{}", side.number())
            }
            (EquipmentFamily::Line | EquipmentFamily::Transformer, Port::State) => {
                "state".to_owned()
            }
            (
                EquipmentFamily::Line | EquipmentFamily::Transformer,
                Port::CurrentLimitsDeactivation,
            ) => "desactivate_currentLimits".to_owned(),
            (EquipmentFamily::Line | EquipmentFamily::Transformer, Port::Current(side)) => {
                format!("i{}", side.suffix())
            }

            (EquipmentFamily::Generator(_), Port::Terminal) => "terminal".to_owned(),
            (EquipmentFamily::Generator(_), Port::SwitchOffSignal1) => {
                "switchOffSignal1".to_owned()
            }
            (EquipmentFamily::Generator(_), Port::SwitchOffSignal2) => {
                "switchOffSignal2".to_owned()
            }
            (EquipmentFamily::Generator(_), Port::UPu) => "UPu".to_owned(),
            (EquipmentFamily::Generator(_), Port::State) => "state".to_owned(),
            (EquipmentFamily::Generator(GeneratorKind::Synchronous), Port::OmegaPu) => {
                "omegaPu".to_owned()
            }
            (
                EquipmentFamily::Generator(GeneratorKind::Synchronous | GeneratorKind::Synchronized),
                Port::OmegaRefPu,
            ) => "omegaRefPu".to_owned(),
            (
                EquipmentFamily::Generator(GeneratorKind::Synchronous | GeneratorKind::Synchronized),
                Port::Running,
            ) => "running".to_owned(),

            (EquipmentFamily::Load(_), Port::Terminal) => "terminal".to_owned(),
            (EquipmentFamily::Load(_), Port::SwitchOffSignal1) => "switchOffSignal1".to_owned(),
            (EquipmentFamily::Load(_), Port::UPu) => "UPu".to_owned(),
            (EquipmentFamily::Load(_), Port::State) => "state".to_owned(),
            (EquipmentFamily::Load(kind @ (LoadKind::OneTransformer | LoadKind::TwoTransformers)), port) => {
                return Self::tap_var(kind, port);
            }
            _ => return None,
        };
        Some(format!("{prefix}_{name}"))
    }

    /// Tap changer variables live on the embedded transformer models, not on the load prefix.
    fn tap_var(kind: LoadKind, port: Port) -> Option<String> {
        let (side, name) = match port {
            Port::TapPosition(side) => (side, "tap"),
            Port::TapLocked(side) => (side, "locked"),
            Port::TapSwitchOffSignal(side) => (side, "switchOffSignal1"),
            _ => return None,
        };
        let transformer = match (kind, side) {
            (LoadKind::OneTransformer, _) => "transformer",
            (LoadKind::TwoTransformers, TransformerSide::Upstream) => "transformerT",
            (LoadKind::TwoTransformers, _) => "transformerD",
            (LoadKind::Base, _) => return None,
        };
        Some(format!("{transformer}_{name}"))
    }

    pub(crate) fn var_mapping(&self, prefix: &str) -> Vec<VarMapping> {
        let pairs: &[(&str, &str)] = match self.family {
            EquipmentFamily::Bus => &[],
            EquipmentFamily::Line | EquipmentFamily::Transformer => &[
                ("P1Pu", "p1"),
                ("Q1Pu", "q1"),
                ("P2Pu", "p2"),
                ("Q2Pu", "q2"),
                ("state", "state"),
            ],
            EquipmentFamily::Generator(_) => {
                &[("PGenPu", "p"), ("QGenPu", "q"), ("state", "state")]
            }
            EquipmentFamily::Load(_) => &[("PPu", "p"), ("QPu", "q"), ("state", "state")],
        };
        pairs
            .iter()
            .map(|(dynamic, static_var)| VarMapping::new(format!("{prefix}_{dynamic}"), *static_var))
            .collect()
    }

    pub(crate) fn create_macro_connections(
        &self,
        model: &BlackBoxModel,
        adder: &mut MacroConnectionsAdder<'_>,
    ) -> Result<Connectivity> {
        match self.family {
            EquipmentFamily::Bus => {
                let terminal = model.require_var(Port::Terminal)?;
                adder.create_network_macro_connections(
                    model,
                    &self.static_id,
                    EquipmentType::Bus,
                    Capability::Bus,
                    |bus| Ok(vec![VarConnection::new(terminal, bus.require_var(Port::Terminal)?)]),
                )?;
            }
            EquipmentFamily::Line | EquipmentFamily::Transformer => {
                for (bus, side) in self.buses.iter().zip([Side::One, Side::Two]) {
                    adder.create_terminal_macro_connections(model, bus, Some(side))?;
                }
            }
            EquipmentFamily::Generator(_) | EquipmentFamily::Load(_) => {
                for bus in &self.buses {
                    adder.create_terminal_macro_connections(model, bus, None)?;
                }
            }
        }
        Ok(Connectivity::Connected)
    }
}
