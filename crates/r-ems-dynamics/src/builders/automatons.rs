//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Builders for pure-dynamic automatons.

use std::collections::HashSet;

use crate::builders::{describe, BuildFailure, BuilderCore, ValidationIssue};
use crate::models::automatons::{
    Automaton, BranchMeasurement, CurrentLimitAutomaton, CurrentLimitTwoLevelsAutomaton,
    Quadripole, QuadripoleType, TapChangerAutomaton, TapChangerBlockingAutomaton,
    UnderVoltageAutomaton, MAX_MEASUREMENTS,
};
use crate::models::{BlackBoxModel, ModelCatalog, ModelCategory, ModelConfig, ModelVariant, TransformerSide};
use crate::network::{EquipmentType, Network, Side};
use crate::report::ReportNode;

const QUADRIPOLES: [EquipmentType; 2] = [EquipmentType::Line, EquipmentType::TwoWindingsTransformer];

macro_rules! common_setters {
    () => {
        pub fn dynamic_model_id(mut self, dynamic_model_id: impl Into<String>) -> Self {
            self.core.dynamic_model_id = Some(dynamic_model_id.into());
            self
        }

        pub fn parameter_set_id(mut self, parameter_set_id: impl Into<String>) -> Self {
            self.core.parameter_set_id = Some(parameter_set_id.into());
            self
        }
    };
}

/// Validates the fields every automaton needs and assembles the model.
fn finish_automaton(
    mut core: BuilderCore<'_>,
    report: &mut ReportNode,
    automaton: Option<Automaton>,
    lib_override: impl FnOnce(&ModelConfig) -> Option<ModelConfig>,
) -> Result<BlackBoxModel, BuildFailure> {
    let config = core.config().map(|(_, config)| config);
    let dynamic_model_id = core.require("dynamicModelId", core.dynamic_model_id.clone());
    let parameter_set_id = core.require("parameterSetId", core.parameter_set_id.clone());
    let built = match (config, dynamic_model_id.clone(), parameter_set_id, automaton) {
        (Some(config), Some(id), Some(par), Some(automaton)) => {
            let config = lib_override(&config).unwrap_or(config);
            Some(BlackBoxModel::new(
                id,
                par,
                config,
                ModelVariant::Automaton(automaton),
            ))
        }
        _ => None,
    };
    core.finish(report, dynamic_model_id.as_deref(), built)
}

fn quadripole(
    core: &mut BuilderCore<'_>,
    field: &'static str,
    id: Option<String>,
) -> Option<Quadripole> {
    let (id, equipment_type) = core.require_equipment(field, id, &QUADRIPOLES)?;
    QuadripoleType::from_equipment_type(equipment_type).map(|kind| Quadripole { id, kind })
}

fn measurement(
    core: &mut BuilderCore<'_>,
    field: &'static str,
    side_field: &'static str,
    id: Option<String>,
    side: Option<Side>,
) -> Option<BranchMeasurement> {
    let quadripole = quadripole(core, field, id);
    let side = core.require(side_field, side);
    let quadripole = quadripole?;
    Some(BranchMeasurement {
        id: quadripole.id,
        kind: quadripole.kind,
        side: side?,
    })
}

/// Current limit automaton on a single measured branch side.
#[derive(Debug)]
pub struct CurrentLimitAutomatonBuilder<'a> {
    core: BuilderCore<'a>,
    measurement: Option<String>,
    side: Option<Side>,
    controlled: Option<String>,
}

impl<'a> CurrentLimitAutomatonBuilder<'a> {
    pub fn of(network: &'a Network, catalog: &ModelCatalog, lib: &str) -> Self {
        Self {
            core: BuilderCore::new(network, catalog, &[ModelCategory::CurrentLimitAutomatons], lib),
            measurement: None,
            side: None,
            controlled: None,
        }
    }

    common_setters!();

    pub fn i_measurement(mut self, id: impl Into<String>) -> Self {
        self.measurement = Some(id.into());
        self
    }

    pub fn i_measurement_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    pub fn controlled_quadripole(mut self, id: impl Into<String>) -> Self {
        self.controlled = Some(id.into());
        self
    }

    pub fn build(mut self, report: &mut ReportNode) -> Result<BlackBoxModel, BuildFailure> {
        let measurement = measurement(
            &mut self.core,
            "iMeasurement",
            "iMeasurementSide",
            self.measurement.take(),
            self.side,
        );
        let controlled = match self.controlled.take() {
            Some(id) => quadripole(&mut self.core, "controlledQuadripole", Some(id)).map(Some),
            None => Some(None),
        };
        let automaton = match (measurement, controlled) {
            (Some(measurement), Some(controlled)) => Some(Automaton::CurrentLimit(
                CurrentLimitAutomaton {
                    measurement,
                    controlled,
                },
            )),
            _ => None,
        };
        finish_automaton(self.core, report, automaton, |_| None)
    }
}

/// Current limit automaton with two independent measurements.
#[derive(Debug)]
pub struct CurrentLimitTwoLevelsAutomatonBuilder<'a> {
    core: BuilderCore<'a>,
    first: (Option<String>, Option<Side>),
    second: (Option<String>, Option<Side>),
    controlled: Option<String>,
}

impl<'a> CurrentLimitTwoLevelsAutomatonBuilder<'a> {
    pub fn of(network: &'a Network, catalog: &ModelCatalog, lib: &str) -> Self {
        Self {
            core: BuilderCore::new(
                network,
                catalog,
                &[ModelCategory::CurrentLimitTwoLevelsAutomatons],
                lib,
            ),
            first: (None, None),
            second: (None, None),
            controlled: None,
        }
    }

    common_setters!();

    pub fn i_measurement1(mut self, id: impl Into<String>) -> Self {
        self.first.0 = Some(id.into());
        self
    }

    pub fn i_measurement1_side(mut self, side: Side) -> Self {
        self.first.1 = Some(side);
        self
    }

    pub fn i_measurement2(mut self, id: impl Into<String>) -> Self {
        self.second.0 = Some(id.into());
        self
    }

    pub fn i_measurement2_side(mut self, side: Side) -> Self {
        self.second.1 = Some(side);
        self
    }

    pub fn controlled_quadripole(mut self, id: impl Into<String>) -> Self {
        self.controlled = Some(id.into());
        self
    }

    pub fn build(mut self, report: &mut ReportNode) -> Result<BlackBoxModel, BuildFailure> {
        let first = measurement(
            &mut self.core,
            "iMeasurement1",
            "iMeasurement1Side",
            self.first.0.take(),
            self.first.1,
        );
        let second = measurement(
            &mut self.core,
            "iMeasurement2",
            "iMeasurement2Side",
            self.second.0.take(),
            self.second.1,
        );
        let controlled = quadripole(&mut self.core, "controlledQuadripole", self.controlled.take());
        let automaton = match (first, second, controlled) {
            (Some(first_measurement), Some(second_measurement), Some(controlled)) => {
                Some(Automaton::CurrentLimitTwoLevels(CurrentLimitTwoLevelsAutomaton {
                    first_measurement,
                    second_measurement,
                    controlled,
                }))
            }
            _ => None,
        };
        finish_automaton(self.core, report, automaton, |_| None)
    }
}

/// Tap changer acting on the transformer of a load model.
#[derive(Debug)]
pub struct TapChangerAutomatonBuilder<'a> {
    core: BuilderCore<'a>,
    load: Option<String>,
    side: TransformerSide,
}

impl<'a> TapChangerAutomatonBuilder<'a> {
    pub fn of(network: &'a Network, catalog: &ModelCatalog, lib: &str) -> Self {
        Self {
            core: BuilderCore::new(network, catalog, &[ModelCategory::TapChangerAutomatons], lib),
            load: None,
            side: TransformerSide::None,
        }
    }

    common_setters!();

    pub fn static_id(mut self, load: impl Into<String>) -> Self {
        self.load = Some(load.into());
        self
    }

    pub fn side(mut self, side: TransformerSide) -> Self {
        self.side = side;
        self
    }

    pub fn build(mut self, report: &mut ReportNode) -> Result<BlackBoxModel, BuildFailure> {
        let automaton = self
            .core
            .require_equipment("staticId", self.load.take(), &[EquipmentType::Load])
            .map(|(load, _)| {
                Automaton::TapChanger(TapChangerAutomaton {
                    load,
                    side: self.side,
                })
            });
        finish_automaton(self.core, report, automaton, |_| None)
    }
}

/// Tap changer blocking automaton.
///
/// `transformers` may mix network transformers, loads and dynamic ids of
/// tap changer automatons; entries are classified at build time.
#[derive(Debug)]
pub struct TapChangerBlockingAutomatonBuilder<'a> {
    core: BuilderCore<'a>,
    measurements: Option<Vec<String>>,
    transformers: Option<Vec<String>>,
    known_tap_changers: HashSet<String>,
}

impl<'a> TapChangerBlockingAutomatonBuilder<'a> {
    pub fn of(network: &'a Network, catalog: &ModelCatalog, lib: &str) -> Self {
        Self {
            core: BuilderCore::new(
                network,
                catalog,
                &[ModelCategory::TapChangerBlockingAutomatons],
                lib,
            ),
            measurements: None,
            transformers: None,
            known_tap_changers: HashSet::new(),
        }
    }

    common_setters!();

    pub fn u_measurements<I, S>(mut self, buses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.measurements = Some(buses.into_iter().map(Into::into).collect());
        self
    }

    pub fn transformers<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transformers = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Dynamic ids of the tap changer automatons declared in the same run.
    pub fn known_tap_changers<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_tap_changers = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(mut self, report: &mut ReportNode) -> Result<BlackBoxModel, BuildFailure> {
        let measurement_points = self.measurement_points();
        let targets = self.targets();
        let automaton = match (measurement_points, targets) {
            (Some(measurement_points), Some((transformers, loads, tap_changers))) => {
                Some(Automaton::TapChangerBlocking(TapChangerBlockingAutomaton {
                    measurement_points,
                    transformers,
                    loads,
                    tap_changers,
                }))
            }
            _ => None,
        };
        let measurements = match &automaton {
            Some(Automaton::TapChangerBlocking(tcb)) => tcb.measurement_points.len(),
            _ => 0,
        };
        finish_automaton(self.core, report, automaton, |config| {
            let mut config = config.clone();
            config.lib = TapChangerBlockingAutomaton::lib_for(&config.lib, measurements);
            config.alias = None;
            Some(config)
        })
    }

    fn measurement_points(&mut self) -> Option<Vec<String>> {
        let buses = self.core.require("uMeasurements", self.measurements.take())?;
        let mut valid = Vec::with_capacity(buses.len());
        for bus in buses {
            if self.core.network.contains(&bus, EquipmentType::Bus) {
                valid.push(bus);
            } else {
                self.core.issue(ValidationIssue::UnknownListEntry {
                    field: "uMeasurements",
                    id: bus,
                    expected: EquipmentType::Bus.to_string(),
                });
            }
        }
        if valid.is_empty() {
            self.core.issue(ValidationIssue::EmptyList {
                field: "uMeasurements",
            });
            return None;
        }
        if valid.len() > MAX_MEASUREMENTS {
            self.core.issue(ValidationIssue::ListTooLong {
                field: "uMeasurements",
                len: valid.len(),
                max: MAX_MEASUREMENTS,
            });
            return None;
        }
        Some(valid)
    }

    #[allow(clippy::type_complexity)]
    fn targets(&mut self) -> Option<(Vec<String>, Vec<String>, Vec<String>)> {
        let ids = self.core.require("transformers", self.transformers.take())?;
        let (mut transformers, mut loads, mut tap_changers) = (Vec::new(), Vec::new(), Vec::new());
        for id in ids {
            match self.core.network.equipment_type(&id) {
                Some(EquipmentType::TwoWindingsTransformer) => transformers.push(id),
                Some(EquipmentType::Load) => loads.push(id),
                _ if self.known_tap_changers.contains(&id) => tap_changers.push(id),
                _ => self.core.issue(ValidationIssue::UnknownListEntry {
                    field: "transformers",
                    id,
                    expected: format!(
                        "{} or tap changer automaton",
                        describe(&[EquipmentType::TwoWindingsTransformer, EquipmentType::Load])
                    ),
                }),
            }
        }
        if transformers.is_empty() && loads.is_empty() && tap_changers.is_empty() {
            self.core.issue(ValidationIssue::EmptyList {
                field: "transformers",
            });
            return None;
        }
        Some((transformers, loads, tap_changers))
    }
}

/// Under voltage automaton tripping one generator.
#[derive(Debug)]
pub struct UnderVoltageAutomatonBuilder<'a> {
    core: BuilderCore<'a>,
    generator: Option<String>,
}

impl<'a> UnderVoltageAutomatonBuilder<'a> {
    pub fn of(network: &'a Network, catalog: &ModelCatalog, lib: &str) -> Self {
        Self {
            core: BuilderCore::new(network, catalog, &[ModelCategory::UnderVoltageAutomatons], lib),
            generator: None,
        }
    }

    common_setters!();

    pub fn generator(mut self, id: impl Into<String>) -> Self {
        self.generator = Some(id.into());
        self
    }

    pub fn build(mut self, report: &mut ReportNode) -> Result<BlackBoxModel, BuildFailure> {
        let automaton = self
            .core
            .require_equipment("generator", self.generator.take(), &[EquipmentType::Generator])
            .map(|(generator, _)| Automaton::UnderVoltage(UnderVoltageAutomaton { generator }));
        finish_automaton(self.core, report, automaton, |_| None)
    }
}
