//! ---
//! ems_section: "15-testing-qa-runbook"
//! ems_subsection: "integration-tests"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Integration and validation tests for the R-EMS stack."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use r_ems_common::DynamicsConfig;
use r_ems_dynasim::{DynamicSimulation, SimulationInputs, SimulationJob};

fn repo_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join(relative)
}

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

fn sample_config() -> Result<DynamicsConfig> {
    DynamicsConfig::from_path(&repo_path("configs/dynamics.toml"))
}

fn prepare(workdir: &Path) -> Result<SimulationJob> {
    let config = sample_config()?;
    let inputs = SimulationInputs::from_files(
        &data("grid.yaml"),
        &data("models.yaml"),
        Some(&data("parameters.yaml")),
    )?;
    Ok(DynamicSimulation::new(config).prepare(workdir, &inputs)?)
}

#[test]
fn sample_configuration_is_valid() -> Result<()> {
    let config = sample_config()?;
    config.validate()?;
    assert_eq!(config.simulation.stop_time, 30.0);
    assert_eq!(config.simulation.curves.len(), 1);
    Ok(())
}

#[test]
fn grid_is_assembled_in_declaration_order() -> Result<()> {
    let workdir = tempfile::tempdir()?;
    let job = prepare(workdir.path())?;
    let architecture = &job.architecture;

    let ids: Vec<&str> = architecture.black_box_models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids.first(), Some(&"G1"));
    assert_eq!(ids.last(), Some(&"OMEGA_REF"));
    for id in ["G2", "GF", "LD1", "LD2", "TCA_LD1", "TCB", "CLA_L1"] {
        assert!(architecture.contains_model(id), "{id} missing");
    }
    assert!(!architecture.contains_model("CLA_L9"));
    assert!(architecture.unconnected_models.is_empty());

    let tcb = architecture
        .black_box_models
        .iter()
        .find(|model| model.id == "TCB")
        .map(|model| model.lib.as_str());
    assert_eq!(tcb, Some("TapChangerBlockingAutomaton2"));
    assert!(
        architecture
            .macro_connectors
            .iter()
            .filter(|connector| connector.id.starts_with("MC_TapChangerBlockingAutomaton2-"))
            .count()
            >= 3
    );
    Ok(())
}

#[test]
fn omega_ref_weights_only_synchronous_and_synchronized_generators() -> Result<()> {
    let workdir = tempfile::tempdir()?;
    prepare(workdir.path())?;

    let omega_ref = fs::read_to_string(workdir.path().join("omega_ref.par"))?;
    assert!(omega_ref.contains(r#"name="nbGen" value="2""#));
    assert!(omega_ref.contains(r#"name="weight_gen_1" value="1000""#));
    assert!(!omega_ref.contains("weight_gen_2"));
    Ok(())
}

#[test]
fn prepared_directory_matches_the_configuration() -> Result<()> {
    let workdir = tempfile::tempdir()?;
    let job = prepare(workdir.path())?;

    let jobs = fs::read_to_string(&job.jobs_file)?;
    assert!(jobs.contains(r#"stopTime="30""#));
    assert!(jobs.contains(r#"iidmFile="grid.yaml""#));
    assert!(jobs.contains(r#"parFile="solvers.par""#));
    assert!(workdir.path().join("grid.yaml").is_file());

    let curves = fs::read_to_string(job.curves_file.as_deref().expect("configured curve"))?;
    assert!(curves.contains(r#"model="NETWORK" variable="B2_Upu_value""#));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(workdir.path().join("report.json"))?)?;
    let rendered = report.to_string();
    assert!(rendered.contains("staticIdUnknown"));
    assert!(rendered.contains("CLA_L9") || rendered.contains("L9"));
    Ok(())
}
