//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Capability tags and connection ports exposed by black-box models.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::network::Side;

/// Connection surfaces a model can offer to others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Capability {
    Bus,
    Line,
    Transformer,
    TapChangeable,
    Generator,
    SynchronizedGenerator,
    Load,
    LoadWithTransformers,
    TapChangerAutomaton,
}

impl Capability {
    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Capabilities attached to a model at construction, queried in O(1).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::iter().filter(move |capability| self.contains(*capability))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), CapabilitySet::with)
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Which transformer of a load-with-transformers a tap changer acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransformerSide {
    #[default]
    None,
    Upstream,
    Downstream,
}

/// Named variable a model exposes; models translate ports to their own
/// variable naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    Terminal,
    BranchTerminal(Side),
    SwitchOff,
    SwitchOffSignal1,
    SwitchOffSignal2,
    Numcc,
    UPu,
    State,
    CurrentLimitsDeactivation,
    Current(Side),
    OmegaPu,
    OmegaRefPu,
    Running,
    TapPosition(TransformerSide),
    TapLocked(TransformerSide),
    TapSwitchOffSignal(TransformerSide),
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::BranchTerminal(side) => write!(f, "Terminal{}", side.suffix()),
            Port::Current(side) => write!(f, "Current{}", side.suffix()),
            Port::TapPosition(side) => write!(f, "TapPosition({side:?})"),
            Port::TapLocked(side) => write!(f, "TapLocked({side:?})"),
            Port::TapSwitchOffSignal(side) => write!(f, "TapSwitchOffSignal({side:?})"),
            other => write!(f, "{other:?}"),
        }
    }
}
