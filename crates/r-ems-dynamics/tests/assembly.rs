//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "tests"
//! ems_type: "test"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use anyhow::Result;
use r_ems_dynamics::builders::{
    build_models, CurrentLimitAutomatonBuilder, CurrentLimitTwoLevelsAutomatonBuilder,
    EquipmentModelBuilder, TapChangerAutomatonBuilder, TapChangerBlockingAutomatonBuilder,
};
use r_ems_dynamics::network::Side;
use r_ems_dynamics::xml::write_dynamic_models;
use r_ems_dynamics::{
    AssemblyOptions, BlackBoxModel, DynamicsContext, DynamicsError, ModelCatalog, Network,
    ParametersDatabase, ParametersSet, ReportNode, Severity,
};

fn generator_parameters(id: &str, h: f64, s_nom: f64) -> ParametersSet {
    let mut set = ParametersSet::new(id);
    set.add_double("generator_H", h);
    set.add_double("generator_SNom", s_nom);
    set
}

fn generator(network: &Network, id: &str, lib: &str, par: &str, report: &mut ReportNode) -> BlackBoxModel {
    EquipmentModelBuilder::of(network, ModelCatalog::bundled(), lib)
        .static_id(id)
        .parameter_set_id(par)
        .build(report)
        .unwrap()
}

fn two_bus_network() -> Network {
    Network::new("two-bus")
        .with_bus("B1")
        .with_bus("B2")
        .with_line("L1", "B1", "B2")
        .with_generator("G1", "B1")
        .with_load("LD1", "B2")
}

#[test]
fn generator_and_line_automaton_scenario() -> Result<()> {
    let network = two_bus_network();
    let mut report = ReportNode::new_root("run", "dynamic simulation");
    let g1 = generator(&network, "G1", "GeneratorSynchronousFourWindings", "GSFW", &mut report);
    let cla = CurrentLimitAutomatonBuilder::of(&network, ModelCatalog::bundled(), "CurrentLimitAutomaton")
        .dynamic_model_id("CLA_L1")
        .parameter_set_id("CLA")
        .i_measurement("L1")
        .i_measurement_side(Side::One)
        .build(&mut report)
        .unwrap();
    let parameters: ParametersDatabase = [generator_parameters("GSFW", 6.3, 1211.0)].into_iter().collect();

    let mut context = DynamicsContext::new(
        &network,
        vec![g1, cla],
        &parameters,
        AssemblyOptions::default(),
        &mut report,
    )?;
    let architecture = context.assemble()?;

    let ids: Vec<&str> = architecture.black_box_models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["G1", "CLA_L1", "OMEGA_REF"]);

    let connectors: Vec<&str> = architecture.macro_connectors.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(
        connectors,
        [
            "MC_GeneratorSynchronousFourWindings-NetworkBus",
            "MC_CurrentLimitAutomaton-NetworkLineSide1",
            "MC_CurrentLimitAutomaton-NetworkLine",
            "MC_DYNModelOmegaRef-GeneratorSynchronousFourWindings",
            "MC_DYNModelOmegaRef-NetworkBus",
        ]
    );

    let to_bus: Vec<_> = architecture
        .connects_with("MC_GeneratorSynchronousFourWindings-NetworkBus")
        .collect();
    assert_eq!(to_bus.len(), 1);
    assert_eq!(to_bus[0].id1, "G1");
    assert_eq!(to_bus[0].id2, "NETWORK");
    assert_eq!(to_bus[0].name2.as_deref(), Some("B1"));

    let omega_ref_bus: Vec<_> = architecture
        .connects_with("MC_DYNModelOmegaRef-NetworkBus")
        .collect();
    assert_eq!(omega_ref_bus[0].index1, Some(0));
    assert_eq!(omega_ref_bus[0].name2.as_deref(), Some("B1"));

    let weights = architecture.omega_ref_parameters.as_ref().unwrap();
    assert_eq!(weights.double("weight_gen_0")?, 6.3 * 1211.0);
    assert!(architecture.unconnected_models.is_empty());
    Ok(())
}

#[test]
fn fifty_generators_share_two_omega_ref_connectors() -> Result<()> {
    let mut network = Network::new("fleet").with_bus("B0");
    for index in 0..50 {
        network = network.with_generator(&format!("G{index}"), "B0");
    }
    let mut report = ReportNode::new_root("run", "dynamic simulation");
    let models: Vec<BlackBoxModel> = (0..50)
        .map(|index| generator(&network, &format!("G{index}"), "GeneratorSynchronousFourWindings", "GSFW", &mut report))
        .collect();
    let parameters: ParametersDatabase = [generator_parameters("GSFW", 5.0, 100.0)].into_iter().collect();

    let mut context = DynamicsContext::new(&network, models, &parameters, AssemblyOptions::default(), &mut report)?;
    let architecture = context.assemble()?;

    let omega_ref_connectors: Vec<&str> = architecture
        .macro_connectors
        .iter()
        .map(|c| c.id.as_str())
        .filter(|id| id.starts_with("MC_DYNModelOmegaRef-"))
        .collect();
    assert_eq!(
        omega_ref_connectors,
        [
            "MC_DYNModelOmegaRef-GeneratorSynchronousFourWindings",
            "MC_DYNModelOmegaRef-NetworkBus"
        ]
    );
    let omega_ref_connects = architecture
        .macro_connects
        .iter()
        .filter(|connect| connect.id1 == "OMEGA_REF")
        .count();
    assert_eq!(omega_ref_connects, 100);

    let weights = architecture.omega_ref_parameters.as_ref().unwrap();
    assert_eq!(weights.get("nbGen").map(|p| p.value.as_str()), Some("50"));
    Ok(())
}

#[test]
fn omega_ref_weights_follow_declaration_order() -> Result<()> {
    let network = Network::new("pair")
        .with_bus("B1")
        .with_generator("GA", "B1")
        .with_generator("GB", "B1");
    let mut report = ReportNode::new_root("run", "dynamic simulation");
    let gb = generator(&network, "GB", "GeneratorSynchronousThreeWindings", "GB_PAR", &mut report);
    let ga = generator(&network, "GA", "GeneratorPV", "GA_PAR", &mut report);
    let parameters: ParametersDatabase = [
        generator_parameters("GA_PAR", 1.0, 10.0),
        generator_parameters("GB_PAR", 2.0, 10.0),
    ]
    .into_iter()
    .collect();

    let mut context = DynamicsContext::new(&network, vec![gb, ga], &parameters, AssemblyOptions::default(), &mut report)?;
    let architecture = context.assemble()?;

    let weights = architecture.omega_ref_parameters.as_ref().unwrap();
    assert_eq!(weights.double("weight_gen_0")?, 20.0);
    assert_eq!(weights.double("weight_gen_1")?, 10.0);
    let indexed: Vec<(&str, Option<usize>)> = architecture
        .macro_connects
        .iter()
        .filter(|connect| connect.id1 == "OMEGA_REF" && connect.id2 != "NETWORK")
        .map(|connect| (connect.id2.as_str(), connect.index1))
        .collect();
    assert_eq!(indexed, [("GB", Some(0)), ("GA", Some(1))]);
    Ok(())
}

#[test]
fn blocking_automaton_without_reachable_tap_changer_is_dropped() -> Result<()> {
    let network = Network::new("tcb")
        .with_bus("B1")
        .with_bus("B2")
        .with_bus("B3")
        .with_transformer("T1", "B1", "B2", false)
        .with_transformer("T2", "B2", "B3", false);
    let mut report = ReportNode::new_root("run", "dynamic simulation");
    let tcb = TapChangerBlockingAutomatonBuilder::of(&network, ModelCatalog::bundled(), "TapChangerBlockingAutomaton")
        .dynamic_model_id("TCB")
        .parameter_set_id("TCB")
        .u_measurements(["B1", "B2", "B3"])
        .transformers(["T1", "T2"])
        .build(&mut report)
        .unwrap();
    assert_eq!(tcb.lib(), "TapChangerBlockingAutomaton3");

    let parameters = ParametersDatabase::new();
    let mut context = DynamicsContext::new(&network, vec![tcb], &parameters, AssemblyOptions::default(), &mut report)?;
    let architecture = context.assemble()?;

    assert!(!architecture.contains_model("TCB"));
    assert_eq!(architecture.unconnected_models, ["TCB"]);
    assert!(architecture.macro_connectors.is_empty());
    assert!(architecture.macro_connects.is_empty());
    assert_eq!(report.entries_with_key("modelUnconnected").len(), 1);
    Ok(())
}

#[test]
fn automaton_on_missing_line_does_not_abort_the_batch() -> Result<()> {
    let network = Network::new("batch")
        .with_bus("B1")
        .with_bus("B2")
        .with_line("L1", "B1", "B2")
        .with_line("L2", "B1", "B2")
        .with_generator("G1", "B1")
        .with_load("LD1", "B2");
    let yaml = r#"
- { kind: equipment, lib: GeneratorSynchronousFourWindings, staticId: G1, parameterSetId: GSFW }
- { kind: equipment, lib: LoadAlphaBeta, staticId: LD1, parameterSetId: LAB }
- { kind: equipment, lib: Line, staticId: L2, parameterSetId: LINE }
- { kind: currentLimitAutomaton, lib: CurrentLimitAutomaton, dynamicModelId: CLA_1, parameterSetId: CLA, iMeasurement: L1, iMeasurementSide: ONE }
- { kind: currentLimitAutomaton, lib: CurrentLimitAutomaton, dynamicModelId: CLA_2, parameterSetId: CLA, iMeasurement: L2, iMeasurementSide: TWO }
- { kind: currentLimitAutomaton, lib: CurrentLimitAutomaton, dynamicModelId: CLA_MISSING, parameterSetId: CLA, iMeasurement: L404, iMeasurementSide: ONE }
- { kind: currentLimitAutomaton, lib: CurrentLimitAutomaton, dynamicModelId: CLA_3, parameterSetId: CLA, iMeasurement: L1, iMeasurementSide: TWO }
- { kind: underVoltageAutomaton, lib: UnderVoltage, dynamicModelId: UV_G1, parameterSetId: UV, generator: G1 }
- { kind: currentLimitAutomaton, lib: CurrentLimitAutomaton, dynamicModelId: CLA_4, parameterSetId: CLA, iMeasurement: L2, iMeasurementSide: ONE, controlledQuadripole: L1 }
- { kind: equipment, lib: Bus, staticId: B1, parameterSetId: BUS }
"#;
    let definitions: Vec<r_ems_dynamics::builders::ModelDefinition> = serde_yaml::from_str(yaml)?;
    assert_eq!(definitions.len(), 10);

    let mut report = ReportNode::new_root("run", "dynamic simulation");
    let models = build_models(&definitions, &network, ModelCatalog::bundled(), &mut report);
    assert_eq!(models.len(), 9);
    assert!(models.iter().all(|model| model.dynamic_model_id() != "CLA_MISSING"));
    assert_eq!(report.entries_with_key("staticIdUnknown").len(), 1);

    let parameters: ParametersDatabase = [generator_parameters("GSFW", 4.0, 500.0)].into_iter().collect();
    let mut context = DynamicsContext::new(&network, models, &parameters, AssemblyOptions::default(), &mut report)?;
    let architecture = context.assemble()?;
    assert_eq!(architecture.black_box_models.len(), 10);
    assert!(architecture.contains_model("OMEGA_REF"));
    Ok(())
}

#[test]
fn assembly_is_deterministic() -> Result<()> {
    fn run() -> Result<String> {
        let network = two_bus_network();
        let mut report = ReportNode::new_root("run", "dynamic simulation");
        let g1 = generator(&network, "G1", "GeneratorSynchronousFourWindings", "GSFW", &mut report);
        let load = EquipmentModelBuilder::of(&network, ModelCatalog::bundled(), "LoadAlphaBeta")
            .static_id("LD1")
            .parameter_set_id("LAB")
            .build(&mut report)
            .unwrap();
        let cla = CurrentLimitAutomatonBuilder::of(&network, ModelCatalog::bundled(), "CurrentLimitAutomaton")
            .dynamic_model_id("CLA_L1")
            .parameter_set_id("CLA")
            .i_measurement("L1")
            .i_measurement_side(Side::Two)
            .build(&mut report)
            .unwrap();
        let parameters: ParametersDatabase = [generator_parameters("GSFW", 6.3, 1211.0)].into_iter().collect();
        let mut context = DynamicsContext::new(
            &network,
            vec![g1, load, cla],
            &parameters,
            AssemblyOptions::default(),
            &mut report,
        )?;
        Ok(write_dynamic_models(&context.assemble()?)?)
    }

    let first = run()?;
    for _ in 0..5 {
        assert_eq!(run()?, first);
    }
    Ok(())
}

#[test]
fn network_defaults_are_created_once_per_equipment() -> Result<()> {
    let network = two_bus_network();
    let mut report = ReportNode::new_root("run", "dynamic simulation");
    let automatons: Vec<BlackBoxModel> = [("CLA_A", Side::One), ("CLA_B", Side::Two), ("CLA_C", Side::One)]
        .into_iter()
        .map(|(id, side)| {
            CurrentLimitAutomatonBuilder::of(&network, ModelCatalog::bundled(), "CurrentLimitAutomaton")
                .dynamic_model_id(id)
                .parameter_set_id("CLA")
                .i_measurement("L1")
                .i_measurement_side(side)
                .build(&mut report)
                .unwrap()
        })
        .collect();
    let parameters = ParametersDatabase::new();
    let mut context = DynamicsContext::new(&network, automatons, &parameters, AssemblyOptions::default(), &mut report)?;
    let architecture = context.assemble()?;

    let defaults: Vec<&str> = context
        .default_models()
        .iter()
        .map(|model| model.dynamic_model_id())
        .collect();
    assert_eq!(defaults, ["L1"]);
    assert_eq!(architecture.black_box_models.len(), 3);
    assert_eq!(architecture.macro_connectors.len(), 3);
    assert_eq!(architecture.macro_connects.len(), 6);
    Ok(())
}

#[test]
fn duplicate_dynamic_ids_are_rejected() {
    let network = two_bus_network();
    let mut report = ReportNode::new_root("run", "dynamic simulation");
    let first = generator(&network, "G1", "GeneratorPV", "GPV", &mut report);
    let second = EquipmentModelBuilder::of(&network, ModelCatalog::bundled(), "LoadAlphaBeta")
        .static_id("LD1")
        .dynamic_model_id("G1")
        .parameter_set_id("LAB")
        .build(&mut report)
        .unwrap();
    let parameters = ParametersDatabase::new();
    let err = DynamicsContext::new(&network, vec![first, second], &parameters, AssemblyOptions::default(), &mut report)
        .err()
        .unwrap();
    assert!(matches!(err, DynamicsError::DuplicateDynamicModelId(id) if id == "G1"));
}

#[test]
fn tap_changer_without_transformer_load_drops_its_blocking_automaton() -> Result<()> {
    let network = Network::new("tca").with_bus("B1").with_load("LD1", "B1");
    let mut report = ReportNode::new_root("run", "dynamic simulation");
    let load = EquipmentModelBuilder::of(&network, ModelCatalog::bundled(), "LoadAlphaBeta")
        .static_id("LD1")
        .parameter_set_id("LAB")
        .build(&mut report)
        .unwrap();
    let tca = TapChangerAutomatonBuilder::of(&network, ModelCatalog::bundled(), "TapChangerAutomaton")
        .dynamic_model_id("TCA_LD1")
        .parameter_set_id("TCA")
        .static_id("LD1")
        .build(&mut report)
        .unwrap();
    let tcb = TapChangerBlockingAutomatonBuilder::of(&network, ModelCatalog::bundled(), "TapChangerBlockingAutomaton")
        .dynamic_model_id("TCB")
        .parameter_set_id("TCB")
        .u_measurements(["B1"])
        .transformers(["TCA_LD1"])
        .known_tap_changers(["TCA_LD1"])
        .build(&mut report)
        .unwrap();

    let parameters = ParametersDatabase::new();
    let mut context = DynamicsContext::new(&network, vec![tcb, load, tca], &parameters, AssemblyOptions::default(), &mut report)?;
    let architecture = context.assemble()?;

    assert_eq!(architecture.unconnected_models, ["TCA_LD1", "TCB"]);
    let ids: Vec<&str> = architecture.black_box_models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["LD1"]);
    assert!(architecture
        .macro_connects
        .iter()
        .all(|connect| !["TCA_LD1", "TCB"].contains(&connect.id1.as_str())
            && !["TCA_LD1", "TCB"].contains(&connect.id2.as_str())));
    assert!(architecture
        .macro_connectors
        .iter()
        .all(|connector| !connector.id.contains("TapChanger")));
    assert_eq!(report.entries_with_key("modelUnconnected").len(), 2);
    Ok(())
}

#[test]
fn two_level_current_limit_uses_one_connector_per_measure() -> Result<()> {
    let network = Network::new("cla2")
        .with_bus("B1")
        .with_bus("B2")
        .with_bus("B3")
        .with_line("L1", "B1", "B2")
        .with_line("L2", "B2", "B3");
    let mut report = ReportNode::new_root("run", "dynamic simulation");
    let cla = CurrentLimitTwoLevelsAutomatonBuilder::of(&network, ModelCatalog::bundled(), "CurrentLimitTwoLevelsAutomaton")
        .dynamic_model_id("CLA_2L")
        .parameter_set_id("CLA")
        .i_measurement1("L1")
        .i_measurement1_side(Side::One)
        .i_measurement2("L2")
        .i_measurement2_side(Side::Two)
        .controlled_quadripole("L1")
        .build(&mut report)
        .unwrap();

    let parameters = ParametersDatabase::new();
    let mut context = DynamicsContext::new(&network, vec![cla], &parameters, AssemblyOptions::default(), &mut report)?;
    let architecture = context.assemble()?;

    let connectors: Vec<(&str, Vec<(&str, &str)>)> = architecture
        .macro_connectors
        .iter()
        .map(|connector| {
            let pairs = connector
                .connections
                .iter()
                .map(|c| (c.var1.as_str(), c.var2.as_str()))
                .collect();
            (connector.id.as_str(), pairs)
        })
        .collect();
    assert_eq!(
        connectors,
        [
            (
                "MC_CurrentLimitTwoLevelsAutomaton-NetworkLineSide1Measure1",
                vec![
                    ("currentLimitAutomaton_IMonitored1", "@NAME@_iSide1"),
                    ("currentLimitAutomaton_AutomatonExists", "@NAME@_desactivate_currentLimits"),
                ]
            ),
            (
                "MC_CurrentLimitTwoLevelsAutomaton-NetworkLineSide2Measure2",
                vec![
                    ("currentLimitAutomaton_IMonitored2", "@NAME@_iSide2"),
                    ("currentLimitAutomaton_AutomatonExists", "@NAME@_desactivate_currentLimits"),
                ]
            ),
            (
                "MC_CurrentLimitTwoLevelsAutomaton-NetworkLine",
                vec![("currentLimitAutomaton_order", "@NAME@_state")]
            ),
        ]
    );

    let connects: Vec<(&str, &str, Option<&str>)> = architecture
        .macro_connects
        .iter()
        .map(|c| (c.connector.as_str(), c.id2.as_str(), c.name2.as_deref()))
        .collect();
    assert_eq!(
        connects,
        [
            ("MC_CurrentLimitTwoLevelsAutomaton-NetworkLineSide1Measure1", "NETWORK", Some("L1")),
            ("MC_CurrentLimitTwoLevelsAutomaton-NetworkLineSide2Measure2", "NETWORK", Some("L2")),
            ("MC_CurrentLimitTwoLevelsAutomaton-NetworkLine", "NETWORK", Some("L1")),
        ]
    );
    Ok(())
}

#[test]
fn partially_connected_blocking_automaton_keeps_resolved_targets() -> Result<()> {
    let network = Network::new("tcb-partial")
        .with_bus("B1")
        .with_bus("B2")
        .with_bus("B3")
        .with_transformer("T1", "B1", "B2", false)
        .with_load("LD1", "B3");
    let mut report = ReportNode::new_root("run", "dynamic simulation");
    let load = EquipmentModelBuilder::of(&network, ModelCatalog::bundled(), "LoadOneTransformer")
        .static_id("LD1")
        .parameter_set_id("LOT")
        .build(&mut report)
        .unwrap();
    let tcb = TapChangerBlockingAutomatonBuilder::of(&network, ModelCatalog::bundled(), "TapChangerBlockingAutomaton")
        .dynamic_model_id("TCB")
        .parameter_set_id("TCB")
        .u_measurements(["B2"])
        .transformers(["T1", "LD1"])
        .build(&mut report)
        .unwrap();

    let parameters = ParametersDatabase::new();
    let mut context = DynamicsContext::new(&network, vec![tcb, load], &parameters, AssemblyOptions::default(), &mut report)?;
    let architecture = context.assemble()?;

    assert!(architecture.unconnected_models.is_empty());
    let tcb_connects: Vec<(&str, &str, Option<&str>)> = architecture
        .macro_connects
        .iter()
        .filter(|connect| connect.id1 == "TCB")
        .map(|c| (c.connector.as_str(), c.id2.as_str(), c.name2.as_deref()))
        .collect();
    assert_eq!(
        tcb_connects,
        [
            ("MC_TapChangerBlockingAutomaton1-LoadOneTransformer", "LD1", None),
            ("MC_TapChangerBlockingAutomaton1-NetworkBusMeasure1", "NETWORK", Some("B2")),
        ]
    );

    let blocked = architecture
        .macro_connectors
        .iter()
        .find(|connector| connector.id == "MC_TapChangerBlockingAutomaton1-LoadOneTransformer")
        .unwrap();
    let pairs: Vec<(&str, &str)> = blocked
        .connections
        .iter()
        .map(|c| (c.var1.as_str(), c.var2.as_str()))
        .collect();
    assert_eq!(pairs, [("tapChangerBlocking_blockedT", "transformer_locked")]);

    let skipped = report.entries_with_key("connectionSkipped");
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].severity, Severity::Warn);
    assert!(skipped[0].message.contains("T1"));
    Ok(())
}
