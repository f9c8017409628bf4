//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use thiserror::Error;

use crate::models::Capability;
use crate::network::EquipmentType;

pub type Result<T> = std::result::Result<T, DynamicsError>;

/// Integration errors raised while assembling a model architecture.
///
/// Invalid user input never surfaces here: builders report it and drop the
/// affected model instead.
#[derive(Debug, Error)]
pub enum DynamicsError {
    #[error("duplicate dynamic model id {0}")]
    DuplicateDynamicModelId(String),
    #[error("generator {0} is not registered in the network")]
    GeneratorNotRegistered(String),
    #[error("default model not implemented for {equipment_type} {static_id}")]
    DefaultModelNotImplemented {
        equipment_type: EquipmentType,
        static_id: String,
    },
    #[error("{model} requires a {capability} model for {target}, none could be resolved")]
    MissingConnection {
        model: String,
        target: String,
        capability: Capability,
    },
    #[error("model {model} ({lib}) does not expose variable {port}")]
    MissingVariable {
        model: String,
        lib: String,
        port: String,
    },
    #[error("macro connector {0} reused with a different variable list")]
    ConnectorPayloadMismatch(String),
    #[error("unknown parameter set {0}")]
    UnknownParameterSet(String),
    #[error("parameter {name} missing from set {set}")]
    MissingParameter { set: String, name: String },
    #[error("parameter {name} of set {set} is not a number: {value}")]
    InvalidParameter {
        set: String,
        name: String,
        value: String,
    },
    #[error("network is invalid: {0}")]
    InvalidNetwork(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    #[error("yaml serialization error: {0}")]
    YamlSerializationFailed(#[from] serde_yaml::Error),
    #[error("xml serialization error: {0}")]
    Xml(String),
}
