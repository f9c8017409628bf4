//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "tests"
//! ems_type: "test"
//! ems_scope: "code"
//! ems_description: "Control CLI preparing and running dynamic simulations."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;

const NETWORK: &str = r#"{
  "id": "two-bus",
  "buses": [{"id": "B1"}, {"id": "B2"}],
  "lines": [{"id": "L1", "bus1": "B1", "bus2": "B2"}],
  "generators": [{"id": "G1", "bus": "B1"}]
}"#;

const MODELS: &str = r#"
- kind: equipment
  lib: GeneratorSynchronousFourWindings
  staticId: G1
  parameterSetId: GSFW
- kind: currentLimitAutomaton
  lib: CurrentLimitAutomaton
  dynamicModelId: CLA_L1
  parameterSetId: CLA
  iMeasurement: L1
  iMeasurementSide: ONE
"#;

const PARAMETERS: &str = r#"[{"id": "GSFW", "parameters": [
  {"name": "generator_H", "type": "DOUBLE", "value": "6.3"},
  {"name": "generator_SNom", "type": "DOUBLE", "value": "1211"}
]}]"#;

fn write_inputs(dir: &Path) -> Result<()> {
    fs::write(dir.join("two-bus.json"), NETWORK)?;
    fs::write(dir.join("models.yaml"), MODELS)?;
    fs::write(dir.join("parameters.json"), PARAMETERS)?;
    Ok(())
}

fn dynctl(dir: &Path, subcommand: &str) -> Result<Command> {
    let mut command = Command::cargo_bin("r-ems-dynctl")?;
    command
        .current_dir(dir)
        .env_remove("R_EMS_DYNAMICS_CONFIG")
        .arg(subcommand)
        .args(["--network", "two-bus.json", "--models", "models.yaml"])
        .args(["--parameters", "parameters.json"]);
    Ok(command)
}

#[test]
fn prepare_writes_the_engine_inputs() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_inputs(dir.path())?;

    let output = dynctl(dir.path(), "prepare")?
        .args(["--workdir", "work", "--json"])
        .args(["--curve", "G1:generator_omegaPu"])
        .output()?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(summary["blackBoxModels"], 3);
    assert_eq!(summary["macroConnectors"], 5);

    let work = dir.path().join("work");
    for name in ["two-bus.dyd", "two-bus.jobs", "two-bus.crv", "two-bus.json", "models.par", "omega_ref.par"] {
        assert!(work.join(name).is_file(), "{name} missing");
    }
    let dyd = fs::read_to_string(work.join("two-bus.dyd"))?;
    assert!(dyd.contains(r#"id="MC_CurrentLimitAutomaton-NetworkLineSide1""#));
    Ok(())
}

#[test]
fn invalid_curve_argument_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_inputs(dir.path())?;
    dynctl(dir.path(), "prepare")?
        .args(["--workdir", "work", "--curve", "G1"])
        .assert()
        .failure();
    assert!(!dir.path().join("work").exists());
    Ok(())
}

#[test]
fn run_reports_a_missing_launcher() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_inputs(dir.path())?;
    fs::write(
        dir.path().join("dynamics.toml"),
        "[engine]\nlauncher = \"./no-such-dynawo.sh\"\n",
    )?;
    let output = dynctl(dir.path(), "run")?.output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no-such-dynawo.sh"));
    Ok(())
}
