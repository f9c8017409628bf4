//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "tests"
//! ems_type: "test"
//! ems_scope: "code"
//! ems_description: "Dynamic simulation job preparation, launch and results retrieval."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use r_ems_common::DynamicsConfig;
use r_ems_dynamics::xml::Curve;
use r_ems_dynasim::{
    DynamicSimulation, DynawoLauncher, SimulationError, SimulationInputs, SimulationStatus,
};

const NETWORK: &str = r#"{
  "id": "grid",
  "buses": [{ "id": "B1" }, { "id": "B2" }],
  "lines": [{ "id": "L1", "bus1": "B1", "bus2": "B2" }],
  "generators": [{ "id": "G1", "bus": "B1" }],
  "loads": [{ "id": "LD1", "bus": "B2" }]
}"#;

const DEFINITIONS: &str = r#"
- kind: equipment
  lib: GeneratorSynchronousFourWindings
  staticId: G1
  parameterSetId: GSFW
- kind: equipment
  lib: LoadAlphaBeta
  staticId: LD1
  parameterSetId: LAB
- kind: currentLimitAutomaton
  lib: CurrentLimitAutomaton
  dynamicModelId: CLA_L1
  parameterSetId: CLA
  iMeasurement: L1
  iMeasurementSide: ONE
"#;

const PARAMETERS: &str = r#"
- id: GSFW
  parameters:
    - { name: generator_H, type: DOUBLE, value: "6.3" }
    - { name: generator_SNom, type: DOUBLE, value: "1211" }
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
    let mut permissions = fs::metadata(&path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions)?;
    Ok(path)
}

fn inputs(dir: &Path) -> Result<SimulationInputs> {
    let network = dir.join("grid.json");
    let definitions = dir.join("models.yaml");
    let parameters = dir.join("parameters.yaml");
    fs::write(&network, NETWORK)?;
    fs::write(&definitions, DEFINITIONS)?;
    fs::write(&parameters, PARAMETERS)?;
    Ok(
        SimulationInputs::from_files(&network, &definitions, Some(&parameters))?.with_curves([
            Curve {
                model: "G1".into(),
                variable: "generator_omegaPu".into(),
            },
        ]),
    )
}

fn simulation(launcher: PathBuf, timeout: Duration) -> DynamicSimulation {
    let mut config = DynamicsConfig::default();
    config.engine.launcher = launcher;
    config.engine.timeout = timeout;
    DynamicSimulation::new(config)
}

#[tokio::test]
async fn successful_run_collects_curves_and_timeline() -> Result<()> {
    let fixtures = tempfile::tempdir()?;
    let workdir = tempfile::tempdir()?;
    let launcher = write_script(
        fixtures.path(),
        "dynawo.sh",
        r#"[ "$1" = "jobs" ] && [ -f "$2" ] || exit 3
mkdir -p outputs/curves outputs/timeline
printf 'time;G1_generator_omegaPu;\n0.0;1.0;\n1.0;0.998;\n' > outputs/curves/curves.csv
printf '0.5 | CLA_L1 | Line L1 opened\n' > outputs/timeline/timeline.log"#,
    )?;

    let inputs = inputs(fixtures.path())?;
    let result = simulation(launcher, Duration::from_secs(30))
        .run(workdir.path(), &inputs)
        .await?;

    assert_eq!(result.status, SimulationStatus::Success);
    assert_eq!(result.curves["G1_generator_omegaPu"].points.len(), 2);
    assert_eq!(result.timeline[0].model, "CLA_L1");
    assert!(workdir.path().join("grid.dyd").is_file());
    assert!(workdir.path().join("report.json").is_file());
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_is_a_failure_result() -> Result<()> {
    let fixtures = tempfile::tempdir()?;
    let workdir = tempfile::tempdir()?;
    let launcher = write_script(fixtures.path(), "dynawo.sh", "echo 'solver diverged' >&2\nexit 2")?;

    let inputs = inputs(fixtures.path())?;
    let result = simulation(launcher, Duration::from_secs(30))
        .run(workdir.path(), &inputs)
        .await?;

    assert_eq!(result.status, SimulationStatus::Failure);
    assert!(result.error.as_deref().unwrap_or_default().contains("solver diverged"));
    Ok(())
}

#[tokio::test]
async fn launcher_reports_exit_status() -> Result<()> {
    let fixtures = tempfile::tempdir()?;
    let launcher = write_script(fixtures.path(), "dynawo.sh", "exit 7")?;
    let jobs = fixtures.path().join("grid.jobs");
    fs::write(&jobs, "")?;

    let err = DynawoLauncher::new(launcher, Duration::from_secs(30))
        .run(&jobs)
        .await
        .unwrap_err();
    assert!(matches!(err, SimulationError::ExecutionFailed { status: Some(7), .. }));
    Ok(())
}

#[tokio::test]
async fn slow_engine_times_out() -> Result<()> {
    let fixtures = tempfile::tempdir()?;
    let launcher = write_script(fixtures.path(), "dynawo.sh", "sleep 5")?;
    let jobs = fixtures.path().join("grid.jobs");
    fs::write(&jobs, "")?;

    let err = DynawoLauncher::new(launcher, Duration::from_millis(200))
        .run(&jobs)
        .await
        .unwrap_err();
    assert!(matches!(err, SimulationError::Timeout(_)));
    Ok(())
}
