//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Job description file (`.jobs`), the engine entry point.

use hard_xml::XmlWrite;

use crate::error::Result;
use crate::xml::{to_document, DYNAWO_NAMESPACE};

/// File names and simulation window of one engine job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDescription {
    pub name: String,
    pub solver_lib: String,
    pub solver_par_file: String,
    pub solver_par_id: String,
    pub network_file: String,
    pub network_par_file: String,
    pub network_par_id: String,
    pub dyd_file: String,
    pub curves_file: Option<String>,
    pub start_time: f64,
    pub stop_time: f64,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:jobs")]
struct JobsXml {
    #[xml(attr = "xmlns:dyn")]
    xmlns: String,
    #[xml(child = "dyn:job")]
    job: JobXml,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:job")]
struct JobXml {
    #[xml(attr = "name")]
    name: String,
    #[xml(child = "dyn:solver")]
    solver: SolverXml,
    #[xml(child = "dyn:modeler")]
    modeler: ModelerXml,
    #[xml(child = "dyn:simulation")]
    simulation: SimulationXml,
    #[xml(child = "dyn:outputs")]
    outputs: OutputsXml,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:solver")]
struct SolverXml {
    #[xml(attr = "lib")]
    lib: String,
    #[xml(attr = "parFile")]
    par_file: String,
    #[xml(attr = "parId")]
    par_id: String,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:modeler")]
struct ModelerXml {
    #[xml(attr = "compileDir")]
    compile_dir: String,
    #[xml(child = "dyn:network")]
    network: NetworkXml,
    #[xml(child = "dyn:dynModels")]
    dyn_models: DynModelsXml,
    #[xml(child = "dyn:precompiledModels")]
    precompiled_models: PrecompiledModelsXml,
    #[xml(child = "dyn:modelicaModels")]
    modelica_models: ModelicaModelsXml,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:network")]
struct NetworkXml {
    #[xml(attr = "iidmFile")]
    iidm_file: String,
    #[xml(attr = "parFile")]
    par_file: String,
    #[xml(attr = "parId")]
    par_id: String,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:dynModels")]
struct DynModelsXml {
    #[xml(attr = "dydFile")]
    dyd_file: String,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:precompiledModels")]
struct PrecompiledModelsXml {
    #[xml(attr = "useStandardModels")]
    use_standard_models: bool,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:modelicaModels")]
struct ModelicaModelsXml {
    #[xml(attr = "useStandardModels")]
    use_standard_models: bool,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:simulation")]
struct SimulationXml {
    #[xml(attr = "startTime")]
    start_time: String,
    #[xml(attr = "stopTime")]
    stop_time: String,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:outputs")]
struct OutputsXml {
    #[xml(attr = "directory")]
    directory: String,
    #[xml(child = "dyn:timeline")]
    timeline: TimelineXml,
    #[xml(child = "dyn:curves")]
    curves: Option<CurvesXml>,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:timeline")]
struct TimelineXml {
    #[xml(attr = "exportMode")]
    export_mode: String,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "dyn:curves")]
struct CurvesXml {
    #[xml(attr = "inputFile")]
    input_file: String,
    #[xml(attr = "exportMode")]
    export_mode: String,
}

pub fn write_jobs(job: &JobDescription) -> Result<String> {
    to_document(&JobsXml {
        xmlns: DYNAWO_NAMESPACE.to_owned(),
        job: JobXml {
            name: job.name.clone(),
            solver: SolverXml {
                lib: job.solver_lib.clone(),
                par_file: job.solver_par_file.clone(),
                par_id: job.solver_par_id.clone(),
            },
            modeler: ModelerXml {
                compile_dir: "outputs/compilation".to_owned(),
                network: NetworkXml {
                    iidm_file: job.network_file.clone(),
                    par_file: job.network_par_file.clone(),
                    par_id: job.network_par_id.clone(),
                },
                dyn_models: DynModelsXml {
                    dyd_file: job.dyd_file.clone(),
                },
                precompiled_models: PrecompiledModelsXml {
                    use_standard_models: true,
                },
                modelica_models: ModelicaModelsXml {
                    use_standard_models: true,
                },
            },
            simulation: SimulationXml {
                start_time: job.start_time.to_string(),
                stop_time: job.stop_time.to_string(),
            },
            outputs: OutputsXml {
                directory: "outputs".to_owned(),
                timeline: TimelineXml {
                    export_mode: "TXT".to_owned(),
                },
                curves: job.curves_file.clone().map(|input_file| CurvesXml {
                    input_file,
                    export_mode: "CSV".to_owned(),
                }),
            },
        },
    })
}
