//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Fallible builders turning user input into black-box models.
//!
//! Builders collect every validation issue before deciding, push each one to
//! the report tree, and yield a [`BuildFailure`] instead of a model when any
//! blocking issue was found. They never return [`crate::DynamicsError`].

pub mod automatons;
pub mod definitions;
pub mod equipment;

use thiserror::Error;

use crate::models::{ModelCatalog, ModelCategory, ModelConfig};
use crate::network::{EquipmentType, Network};
use crate::report::{ReportNode, Severity};

pub use automatons::{
    CurrentLimitAutomatonBuilder, CurrentLimitTwoLevelsAutomatonBuilder,
    TapChangerAutomatonBuilder, TapChangerBlockingAutomatonBuilder, UnderVoltageAutomatonBuilder,
};
pub use definitions::{build_models, load_definitions_from_file, ModelDefinition};
pub use equipment::EquipmentModelBuilder;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("library '{lib}' not found")]
    LibNotFound { lib: String },
    #[error("'{field}' field is not set")]
    FieldNotSet { field: &'static str },
    #[error("'{field}' field value '{id}' not found as {expected}")]
    StaticIdUnknown {
        field: &'static str,
        id: String,
        expected: String,
    },
    #[error("'{field}' list is empty")]
    EmptyList { field: &'static str },
    #[error("'{field}' list has {len} entries, at most {max} allowed")]
    ListTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("'{field}' entry '{id}' not found as {expected}, entry ignored")]
    UnknownListEntry {
        field: &'static str,
        id: String,
        expected: String,
    },
}

impl ValidationIssue {
    pub fn key(&self) -> &'static str {
        match self {
            ValidationIssue::LibNotFound { .. } => "libNotFound",
            ValidationIssue::FieldNotSet { .. } => "fieldNotSet",
            ValidationIssue::StaticIdUnknown { .. } => "staticIdUnknown",
            ValidationIssue::EmptyList { .. } => "emptyList",
            ValidationIssue::ListTooLong { .. } => "listTooLong",
            ValidationIssue::UnknownListEntry { .. } => "unknownListEntry",
        }
    }

    /// Blocking issues prevent the model from being built.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, ValidationIssue::UnknownListEntry { .. })
    }

    fn severity(&self) -> Severity {
        if self.is_blocking() {
            Severity::Warn
        } else {
            Severity::Trace
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model {name} ({lib}) not built: {} validation issue(s)", .issues.len())]
pub struct BuildFailure {
    pub name: String,
    pub lib: String,
    pub issues: Vec<ValidationIssue>,
}

/// State shared by every builder.
#[derive(Debug)]
pub(crate) struct BuilderCore<'a> {
    pub(crate) network: &'a Network,
    lib: String,
    config: Option<(ModelCategory, ModelConfig)>,
    pub(crate) dynamic_model_id: Option<String>,
    pub(crate) parameter_set_id: Option<String>,
    issues: Vec<ValidationIssue>,
}

impl<'a> BuilderCore<'a> {
    pub(crate) fn new(
        network: &'a Network,
        catalog: &ModelCatalog,
        categories: &[ModelCategory],
        lib: &str,
    ) -> Self {
        Self {
            network,
            lib: lib.to_owned(),
            config: catalog
                .find_in(categories, lib)
                .map(|(category, config)| (category, config.clone())),
            dynamic_model_id: None,
            parameter_set_id: None,
            issues: Vec::new(),
        }
    }

    pub(crate) fn issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub(crate) fn config(&mut self) -> Option<(ModelCategory, ModelConfig)> {
        if self.config.is_none() {
            self.issue(ValidationIssue::LibNotFound {
                lib: self.lib.clone(),
            });
        }
        self.config.clone()
    }

    pub(crate) fn require<T>(&mut self, field: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.issue(ValidationIssue::FieldNotSet { field });
        }
        value
    }

    /// `id` must exist in the network with one of `expected` types.
    pub(crate) fn require_equipment(
        &mut self,
        field: &'static str,
        id: Option<String>,
        expected: &[EquipmentType],
    ) -> Option<(String, EquipmentType)> {
        let id = self.require(field, id)?;
        match self.network.equipment_type(&id) {
            Some(found) if expected.contains(&found) => Some((id, found)),
            _ => {
                self.issue(ValidationIssue::StaticIdUnknown {
                    field,
                    expected: describe(expected),
                    id,
                });
                None
            }
        }
    }

    /// Report every issue; fail if one of them blocks construction.
    pub(crate) fn finish<T>(
        self,
        report: &mut ReportNode,
        name: Option<&str>,
        built: Option<T>,
    ) -> Result<T, BuildFailure> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.dynamic_model_id.clone())
            .unwrap_or_else(|| "<unnamed>".to_owned());
        for issue in &self.issues {
            report.report(
                issue.key(),
                format!("Model {name} ({}): {issue}", self.lib),
                issue.severity(),
            );
        }
        match built {
            Some(model) if !self.issues.iter().any(ValidationIssue::is_blocking) => Ok(model),
            _ => Err(BuildFailure {
                name,
                lib: self.lib,
                issues: self.issues,
            }),
        }
    }
}

pub(crate) fn describe(types: &[EquipmentType]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}
