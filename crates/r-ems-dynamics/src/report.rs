//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Hierarchical diagnostics collected while building and assembling models.

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Trace,
    Info,
    Warn,
    Error,
}

/// One node of the report tree. Leaf nodes are the diagnostics themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportNode {
    pub key: String,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ReportNode>,
}

impl ReportNode {
    pub fn new_root(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
            severity: Severity::Info,
            children: Vec::new(),
        }
    }

    /// Open a sub-section and return it for further reporting.
    pub fn add_child(&mut self, key: impl Into<String>, message: impl Into<String>) -> &mut ReportNode {
        self.children.push(ReportNode::new_root(key, message));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Record a diagnostic and mirror it as a tracing event.
    pub fn report(&mut self, key: impl Into<String>, message: impl Into<String>, severity: Severity) {
        let key = key.into();
        let message = message.into();
        match severity {
            Severity::Trace => debug!(report_key = %key, "{message}"),
            Severity::Info => info!(report_key = %key, "{message}"),
            Severity::Warn => warn!(report_key = %key, "{message}"),
            Severity::Error => error!(report_key = %key, "{message}"),
        }
        self.children.push(ReportNode {
            key,
            message,
            severity,
            children: Vec::new(),
        });
    }

    /// Every node in the subtree (self included) carrying `key`, depth first.
    pub fn entries_with_key(&self, key: &str) -> Vec<&ReportNode> {
        let mut found = Vec::new();
        self.collect(key, &mut found);
        found
    }

    fn collect<'a>(&'a self, key: &str, found: &mut Vec<&'a ReportNode>) {
        if self.key == key {
            found.push(self);
        }
        for child in &self.children {
            child.collect(key, found);
        }
    }

    pub fn max_severity(&self) -> Severity {
        self.children
            .iter()
            .map(ReportNode::max_severity)
            .fold(self.severity, Severity::max)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
