//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Parameter sets referenced by black-box models.

use std::{fs, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::{DynamicsError, Result};

/// Read access to numeric parameters, keyed by `(set, name)`.
pub trait ParameterDatabase {
    fn double(&self, set: &str, name: &str) -> Result<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ParameterKind {
    Double,
    Int,
    Bool,
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersSet {
    pub id: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl ParametersSet {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parameters: Vec::new(),
        }
    }

    pub fn add_double(&mut self, name: impl Into<String>, value: f64) {
        self.push(name, ParameterKind::Double, value.to_string());
    }

    pub fn add_int(&mut self, name: impl Into<String>, value: i64) {
        self.push(name, ParameterKind::Int, value.to_string());
    }

    pub fn add_bool(&mut self, name: impl Into<String>, value: bool) {
        self.push(name, ParameterKind::Bool, value.to_string());
    }

    pub fn add_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(name, ParameterKind::String, value.into());
    }

    fn push(&mut self, name: impl Into<String>, kind: ParameterKind, value: String) {
        self.parameters.push(Parameter {
            name: name.into(),
            kind,
            value,
        });
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn double(&self, name: &str) -> Result<f64> {
        let parameter = self
            .get(name)
            .ok_or_else(|| DynamicsError::MissingParameter {
                set: self.id.clone(),
                name: name.to_owned(),
            })?;
        parameter
            .value
            .trim()
            .parse::<f64>()
            .map_err(|_| DynamicsError::InvalidParameter {
                set: self.id.clone(),
                name: name.to_owned(),
                value: parameter.value.clone(),
            })
    }
}

/// In-memory parameter database, usually loaded from the models parameter file export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParametersDatabase {
    #[serde(default)]
    sets: IndexMap<String, ParametersSet>,
}

impl ParametersDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, set: ParametersSet) {
        self.sets.insert(set.id.clone(), set);
    }

    pub fn set(&self, id: &str) -> Option<&ParametersSet> {
        self.sets.get(id)
    }

    pub fn sets(&self) -> impl Iterator<Item = &ParametersSet> {
        self.sets.values()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Accepts either a list of sets or a `{ "sets": { id: set } }` document.
    pub fn from_json(data: &str) -> Result<Self> {
        let document: ParametersDocument = serde_json::from_str(data)?;
        Ok(document.into())
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        let document: ParametersDocument = serde_yaml::from_str(data)?;
        Ok(document.into())
    }
}

impl FromIterator<ParametersSet> for ParametersDatabase {
    fn from_iter<I: IntoIterator<Item = ParametersSet>>(iter: I) -> Self {
        let mut database = ParametersDatabase::new();
        for set in iter {
            database.insert(set);
        }
        database
    }
}

impl ParameterDatabase for ParametersDatabase {
    fn double(&self, set: &str, name: &str) -> Result<f64> {
        self.sets
            .get(set)
            .ok_or_else(|| DynamicsError::UnknownParameterSet(set.to_owned()))?
            .double(name)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParametersDocument {
    List(Vec<ParametersSet>),
    Map { sets: IndexMap<String, ParametersSet> },
}

impl From<ParametersDocument> for ParametersDatabase {
    fn from(document: ParametersDocument) -> Self {
        match document {
            ParametersDocument::List(sets) => sets.into_iter().collect(),
            ParametersDocument::Map { sets } => ParametersDatabase { sets },
        }
    }
}

pub fn load_parameters_from_file(path: impl AsRef<Path>) -> Result<ParametersDatabase> {
    let data = fs::read_to_string(path)?;
    let trimmed = data.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        ParametersDatabase::from_json(&data)
    } else {
        ParametersDatabase::from_yaml(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator_set() -> ParametersSet {
        let mut set = ParametersSet::new("GEN");
        set.add_double("generator_H", 5.4);
        set.add_double("generator_SNom", 1150.0);
        set.add_string("generator_comment", "not a number");
        set
    }

    #[test]
    fn reads_doubles_through_database_trait() {
        let database: ParametersDatabase = [generator_set()].into_iter().collect();
        let h = database.double("GEN", "generator_H").unwrap();
        assert!((h - 5.4).abs() < f64::EPSILON);
    }

    #[test]
    fn reports_unknown_set_missing_and_invalid_values() {
        let database: ParametersDatabase = [generator_set()].into_iter().collect();
        assert!(matches!(
            database.double("LOAD", "load_alpha"),
            Err(DynamicsError::UnknownParameterSet(set)) if set == "LOAD"
        ));
        assert!(matches!(
            database.double("GEN", "generator_XPu"),
            Err(DynamicsError::MissingParameter { .. })
        ));
        assert!(matches!(
            database.double("GEN", "generator_comment"),
            Err(DynamicsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn parses_list_documents() {
        let json = r#"[{"id": "GEN", "parameters": [{"name": "generator_H", "type": "DOUBLE", "value": "6.3"}]}]"#;
        let database = ParametersDatabase::from_json(json).unwrap();
        assert_eq!(database.len(), 1);
        assert_eq!(
            database.set("GEN").and_then(|s| s.get("generator_H")).map(|p| p.kind),
            Some(ParameterKind::Double)
        );
    }

    #[test]
    fn parses_keyed_yaml_documents() {
        let yaml = "sets:\n  GEN:\n    id: GEN\n    parameters:\n      - name: generator_SNom\n        type: DOUBLE\n        value: \"500\"\n";
        let database = ParametersDatabase::from_yaml(yaml).unwrap();
        assert_eq!(database.double("GEN", "generator_SNom").unwrap(), 500.0);
    }
}
