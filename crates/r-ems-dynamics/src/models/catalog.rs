//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Model-library catalog: which engine libraries exist per model category.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::error::Result;

const BUNDLED_CATALOG: &str = include_str!("../../resources/models.json");

static BUNDLED: Lazy<ModelCatalog> = Lazy::new(|| {
    ModelCatalog::from_json(BUNDLED_CATALOG).expect("bundled model catalog must parse")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ModelCategory {
    Buses,
    Lines,
    Transformers,
    SynchronousGenerators,
    SynchronizedGenerators,
    FictitiousGenerators,
    BaseLoads,
    LoadsOneTransformer,
    LoadsTwoTransformers,
    CurrentLimitAutomatons,
    CurrentLimitTwoLevelsAutomatons,
    TapChangerAutomatons,
    TapChangerBlockingAutomatons,
    UnderVoltageAutomatons,
}

impl ModelCategory {
    pub const EQUIPMENTS: [ModelCategory; 9] = [
        ModelCategory::Buses,
        ModelCategory::Lines,
        ModelCategory::Transformers,
        ModelCategory::SynchronousGenerators,
        ModelCategory::SynchronizedGenerators,
        ModelCategory::FictitiousGenerators,
        ModelCategory::BaseLoads,
        ModelCategory::LoadsOneTransformer,
        ModelCategory::LoadsTwoTransformers,
    ];

    /// Variable prefix used when a library does not declare its own.
    pub fn default_prefix(self) -> &'static str {
        match self {
            ModelCategory::Buses => "bus",
            ModelCategory::Lines => "line",
            ModelCategory::Transformers => "transformer",
            ModelCategory::SynchronousGenerators
            | ModelCategory::SynchronizedGenerators
            | ModelCategory::FictitiousGenerators => "generator",
            ModelCategory::BaseLoads
            | ModelCategory::LoadsOneTransformer
            | ModelCategory::LoadsTwoTransformers => "load",
            ModelCategory::CurrentLimitAutomatons
            | ModelCategory::CurrentLimitTwoLevelsAutomatons => "currentLimitAutomaton",
            ModelCategory::TapChangerAutomatons => "tapChanger",
            ModelCategory::TapChangerBlockingAutomatons => "tapChangerBlocking",
            ModelCategory::UnderVoltageAutomatons => "underVoltageAutomaton",
        }
    }
}

/// One engine library entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub lib: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_model_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,
}

impl ModelConfig {
    pub fn new(lib: impl Into<String>) -> Self {
        Self {
            lib: lib.into(),
            alias: None,
            internal_model_prefix: None,
            properties: Vec::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.internal_model_prefix = Some(prefix.into());
        self
    }

    /// Name users refer to the library by.
    pub fn name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.lib)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.lib == name || self.alias.as_deref() == Some(name)
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalog {
    categories: IndexMap<ModelCategory, Vec<ModelConfig>>,
}

impl ModelCatalog {
    /// Catalog shipped with the crate, parsed on first access.
    pub fn bundled() -> &'static ModelCatalog {
        &BUNDLED
    }

    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn with_category(mut self, category: ModelCategory, configs: Vec<ModelConfig>) -> Self {
        self.categories.insert(category, configs);
        self
    }

    pub fn configs(&self, category: ModelCategory) -> &[ModelConfig] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn find(&self, category: ModelCategory, name: &str) -> Option<&ModelConfig> {
        self.configs(category).iter().find(|config| config.matches(name))
    }

    /// First category among `categories` declaring `name`.
    pub fn find_in(
        &self,
        categories: &[ModelCategory],
        name: &str,
    ) -> Option<(ModelCategory, &ModelConfig)> {
        categories
            .iter()
            .find_map(|category| self.find(*category, name).map(|config| (*category, config)))
    }

    pub fn default_config(&self, category: ModelCategory) -> Option<&ModelConfig> {
        self.configs(category).first()
    }

    pub fn libs(&self, category: ModelCategory) -> impl Iterator<Item = &str> {
        self.configs(category).iter().map(ModelConfig::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn bundled_catalog_covers_every_category() {
        let catalog = ModelCatalog::bundled();
        for category in ModelCategory::iter() {
            assert!(
                !catalog.configs(category).is_empty(),
                "category {category} is empty"
            );
        }
    }

    #[test]
    fn lookup_matches_lib_or_alias() {
        let catalog = ModelCatalog::default().with_category(
            ModelCategory::SynchronousGenerators,
            vec![ModelConfig {
                lib: "GeneratorSynchronousFourWindingsProportionalRegulations".into(),
                alias: Some("GeneratorSynchronousFourWindingsPR".into()),
                internal_model_prefix: None,
                properties: vec!["SYNCHRONIZED".into()],
            }],
        );
        let by_alias = catalog
            .find(ModelCategory::SynchronousGenerators, "GeneratorSynchronousFourWindingsPR")
            .unwrap();
        assert_eq!(by_alias.lib, "GeneratorSynchronousFourWindingsProportionalRegulations");
        assert!(catalog
            .find(
                ModelCategory::SynchronousGenerators,
                "GeneratorSynchronousFourWindingsProportionalRegulations"
            )
            .is_some());
        assert!(catalog.find(ModelCategory::BaseLoads, "LoadAlphaBeta").is_none());
        assert_eq!(by_alias.name(), "GeneratorSynchronousFourWindingsPR");
    }

    #[test]
    fn find_in_reports_the_matching_category() {
        let catalog = ModelCatalog::bundled();
        let (category, config) = catalog
            .find_in(&ModelCategory::EQUIPMENTS, "LoadOneTransformer")
            .unwrap();
        assert_eq!(category, ModelCategory::LoadsOneTransformer);
        assert_eq!(config.lib, "LoadOneTransformer");
    }
}
