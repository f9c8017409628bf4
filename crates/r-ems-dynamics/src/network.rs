//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Read-only equipment graph the dynamic models are bound to.

use std::collections::HashSet;
use std::{fs, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::{DynamicsError, Result};

/// Equipment kinds the assembly knows how to reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentType {
    Bus,
    Line,
    TwoWindingsTransformer,
    Generator,
    Load,
    ShuntCompensator,
}

/// Branch side used by measurements and terminal connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    #[default]
    One,
    Two,
}

impl Side {
    pub fn number(self) -> u8 {
        match self {
            Side::One => 1,
            Side::Two => 2,
        }
    }

    /// Suffix appended to connector ids and variable names (`Side1`, `Side2`).
    pub fn suffix(self) -> String {
        format!("Side{}", self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bus {
    pub id: String,
    #[serde(default)]
    pub nominal_voltage_kv: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub id: String,
    pub bus1: String,
    pub bus2: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoWindingsTransformer {
    pub id: String,
    pub bus1: String,
    pub bus2: String,
    #[serde(default)]
    pub tap_changer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Injection {
    pub id: String,
    pub bus: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNetwork {
    id: String,
    #[serde(default)]
    buses: Vec<Bus>,
    #[serde(default)]
    lines: Vec<Line>,
    #[serde(default)]
    transformers: Vec<TwoWindingsTransformer>,
    #[serde(default)]
    generators: Vec<Injection>,
    #[serde(default)]
    loads: Vec<Injection>,
    #[serde(default)]
    shunts: Vec<Injection>,
}

impl From<RawNetwork> for Network {
    fn from(raw: RawNetwork) -> Self {
        let mut network = Network {
            id: raw.id,
            buses: raw.buses,
            lines: raw.lines,
            transformers: raw.transformers,
            generators: raw.generators,
            loads: raw.loads,
            shunts: raw.shunts,
            index: IndexMap::new(),
        };
        network.reindex();
        network
    }
}

/// Equipment graph deserialized from the network export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawNetwork")]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub buses: Vec<Bus>,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub transformers: Vec<TwoWindingsTransformer>,
    #[serde(default)]
    pub generators: Vec<Injection>,
    #[serde(default)]
    pub loads: Vec<Injection>,
    #[serde(default)]
    pub shunts: Vec<Injection>,
    #[serde(skip)]
    index: IndexMap<String, (EquipmentType, usize)>,
}

impl Network {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_bus(mut self, id: &str) -> Self {
        self.buses.push(Bus {
            id: id.to_owned(),
            nominal_voltage_kv: None,
        });
        self.reindex();
        self
    }

    pub fn with_line(mut self, id: &str, bus1: &str, bus2: &str) -> Self {
        self.lines.push(Line {
            id: id.to_owned(),
            bus1: bus1.to_owned(),
            bus2: bus2.to_owned(),
        });
        self.reindex();
        self
    }

    pub fn with_transformer(mut self, id: &str, bus1: &str, bus2: &str, tap_changer: bool) -> Self {
        self.transformers.push(TwoWindingsTransformer {
            id: id.to_owned(),
            bus1: bus1.to_owned(),
            bus2: bus2.to_owned(),
            tap_changer,
        });
        self.reindex();
        self
    }

    pub fn with_generator(mut self, id: &str, bus: &str) -> Self {
        self.generators.push(Injection {
            id: id.to_owned(),
            bus: bus.to_owned(),
        });
        self.reindex();
        self
    }

    pub fn with_load(mut self, id: &str, bus: &str) -> Self {
        self.loads.push(Injection {
            id: id.to_owned(),
            bus: bus.to_owned(),
        });
        self.reindex();
        self
    }

    pub fn with_shunt(mut self, id: &str, bus: &str) -> Self {
        self.shunts.push(Injection {
            id: id.to_owned(),
            bus: bus.to_owned(),
        });
        self.reindex();
        self
    }

    fn reindex(&mut self) {
        let mut index = IndexMap::new();
        let groups: [(EquipmentType, Vec<&str>); 6] = [
            (EquipmentType::Bus, self.buses.iter().map(|b| b.id.as_str()).collect()),
            (EquipmentType::Line, self.lines.iter().map(|l| l.id.as_str()).collect()),
            (
                EquipmentType::TwoWindingsTransformer,
                self.transformers.iter().map(|t| t.id.as_str()).collect(),
            ),
            (
                EquipmentType::Generator,
                self.generators.iter().map(|g| g.id.as_str()).collect(),
            ),
            (EquipmentType::Load, self.loads.iter().map(|l| l.id.as_str()).collect()),
            (
                EquipmentType::ShuntCompensator,
                self.shunts.iter().map(|s| s.id.as_str()).collect(),
            ),
        ];
        for (equipment_type, ids) in groups {
            for (position, id) in ids.into_iter().enumerate() {
                index
                    .entry(id.to_owned())
                    .or_insert((equipment_type, position));
            }
        }
        self.index = index;
    }

    /// Check id uniqueness and that every bus reference resolves.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let all_ids = self
            .buses
            .iter()
            .map(|b| &b.id)
            .chain(self.lines.iter().map(|l| &l.id))
            .chain(self.transformers.iter().map(|t| &t.id))
            .chain(self.generators.iter().map(|g| &g.id))
            .chain(self.loads.iter().map(|l| &l.id))
            .chain(self.shunts.iter().map(|s| &s.id));
        for id in all_ids {
            if !seen.insert(id.as_str()) {
                return Err(DynamicsError::InvalidNetwork(format!(
                    "equipment id {id} is declared twice"
                )));
            }
        }

        let bus_refs = self
            .lines
            .iter()
            .flat_map(|l| [(&l.id, &l.bus1), (&l.id, &l.bus2)])
            .chain(
                self.transformers
                    .iter()
                    .flat_map(|t| [(&t.id, &t.bus1), (&t.id, &t.bus2)]),
            )
            .chain(self.generators.iter().map(|g| (&g.id, &g.bus)))
            .chain(self.loads.iter().map(|l| (&l.id, &l.bus)))
            .chain(self.shunts.iter().map(|s| (&s.id, &s.bus)));
        for (equipment, bus) in bus_refs {
            if self.equipment_type(bus) != Some(EquipmentType::Bus) {
                return Err(DynamicsError::InvalidNetwork(format!(
                    "{equipment} references unknown bus {bus}"
                )));
            }
        }
        Ok(())
    }

    pub fn equipment_type(&self, id: &str) -> Option<EquipmentType> {
        self.index.get(id).map(|(equipment_type, _)| *equipment_type)
    }

    pub fn contains(&self, id: &str, equipment_type: EquipmentType) -> bool {
        self.equipment_type(id) == Some(equipment_type)
    }

    pub fn line(&self, id: &str) -> Option<&Line> {
        match self.index.get(id) {
            Some((EquipmentType::Line, position)) => self.lines.get(*position),
            _ => None,
        }
    }

    pub fn transformer(&self, id: &str) -> Option<&TwoWindingsTransformer> {
        match self.index.get(id) {
            Some((EquipmentType::TwoWindingsTransformer, position)) => {
                self.transformers.get(*position)
            }
            _ => None,
        }
    }

    pub fn generator(&self, id: &str) -> Option<&Injection> {
        match self.index.get(id) {
            Some((EquipmentType::Generator, position)) => self.generators.get(*position),
            _ => None,
        }
    }

    pub fn load(&self, id: &str) -> Option<&Injection> {
        match self.index.get(id) {
            Some((EquipmentType::Load, position)) => self.loads.get(*position),
            _ => None,
        }
    }

    /// Buses an equipment is attached to, ordered by side.
    pub fn connectable_buses(&self, id: &str) -> Vec<String> {
        match self.index.get(id) {
            Some((EquipmentType::Bus, _)) => vec![id.to_owned()],
            Some((EquipmentType::Line, position)) => self
                .lines
                .get(*position)
                .map(|l| vec![l.bus1.clone(), l.bus2.clone()])
                .unwrap_or_default(),
            Some((EquipmentType::TwoWindingsTransformer, position)) => self
                .transformers
                .get(*position)
                .map(|t| vec![t.bus1.clone(), t.bus2.clone()])
                .unwrap_or_default(),
            Some((EquipmentType::Generator, position)) => self
                .generators
                .get(*position)
                .map(|g| vec![g.bus.clone()])
                .unwrap_or_default(),
            Some((EquipmentType::Load, position)) => self
                .loads
                .get(*position)
                .map(|l| vec![l.bus.clone()])
                .unwrap_or_default(),
            Some((EquipmentType::ShuntCompensator, position)) => self
                .shunts
                .get(*position)
                .map(|s| vec![s.bus.clone()])
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Bus of a single-terminal equipment, or of the requested branch side.
    pub fn connectable_bus(&self, id: &str, side: Side) -> Option<String> {
        let buses = self.connectable_buses(id);
        match (buses.len(), side) {
            (1, _) => buses.into_iter().next(),
            (2, Side::One) => buses.into_iter().next(),
            (2, Side::Two) => buses.into_iter().nth(1),
            _ => None,
        }
    }
}

/// Load a network from a JSON or YAML document and validate it.
pub fn load_network_from_file(path: impl AsRef<Path>) -> Result<Network> {
    let data = fs::read_to_string(path)?;
    let network: Network = if data.trim_start().starts_with('{') {
        serde_json::from_str(&data)?
    } else {
        serde_yaml::from_str(&data).map_err(DynamicsError::YamlSerializationFailed)?
    };
    network.validate()?;
    Ok(network)
}
