//! Model registry
//!
//! Metadata about the hosted models users can pick from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::ModelsConfig;
use crate::error::{Result, SvgenError};
use crate::request::ModelId;

/// Information about a hosted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: ModelId,

    /// Human-readable name
    pub name: String,

    pub vendor: String,

    pub description: String,

    /// Guidance shown next to the model picker
    pub notes: Vec<String>,
}

/// Registry of known models
pub struct ModelRegistry {
    model_info: HashMap<ModelId, ModelInfo>,
}

impl ModelRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            model_info: HashMap::new(),
        }
    }

    /// Create registry with every supported model
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(create_model_info(
            ModelId::OpenAiGpt41,
            "GPT-4.1",
            "OpenAI",
            vec!["Default choice", "Strong at following layout instructions"],
        ));
        registry.register(create_model_info(
            ModelId::Claude4Sonnet,
            "Claude 4 Sonnet",
            "Anthropic",
            vec!["Good with detailed, multi-element scenes"],
        ));
        registry.register(create_model_info(
            ModelId::Claude37Sonnet,
            "Claude 3.7 Sonnet",
            "Anthropic",
            vec![],
        ));
        registry.register(create_model_info(
            ModelId::Claude35Sonnet,
            "Claude 3.5 Sonnet",
            "Anthropic",
            vec!["Fastest of the listed models"],
        ));

        registry
    }

    /// Register (or replace) model info
    pub fn register(&mut self, info: ModelInfo) {
        self.model_info.insert(info.id, info);
    }

    /// Get model info by ID
    pub fn get(&self, id: ModelId) -> Result<&ModelInfo> {
        self.model_info
            .get(&id)
            .ok_or_else(|| SvgenError::UnknownModel {
                model: id.to_string(),
            })
    }

    /// Check if a model is registered
    pub fn has_model(&self, id: ModelId) -> bool {
        self.model_info.contains_key(&id)
    }

    /// All registered models, in picker order
    pub fn list(&self) -> Vec<&ModelInfo> {
        ModelId::ALL
            .iter()
            .filter_map(|id| self.model_info.get(id))
            .collect()
    }

    /// Registered models enabled by `models`
    pub fn list_allowed(&self, models: &ModelsConfig) -> Vec<&ModelInfo> {
        self.list()
            .into_iter()
            .filter(|info| models.is_allowed(info.id))
            .collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn create_model_info(id: ModelId, name: &str, vendor: &str, notes: Vec<&str>) -> ModelInfo {
    ModelInfo {
        id,
        name: name.to_string(),
        vendor: vendor.to_string(),
        description: id.description().to_string(),
        notes: notes.into_iter().map(String::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_defaults() {
        let registry = ModelRegistry::with_defaults();
        for id in ModelId::ALL {
            assert!(registry.has_model(id));
        }
    }

    #[test]
    fn test_list_order_matches_picker() {
        let registry = ModelRegistry::with_defaults();
        let ids: Vec<_> = registry.list().iter().map(|m| m.id).collect();
        assert_eq!(ids, ModelId::ALL.to_vec());
    }

    #[test]
    fn test_get_unregistered() {
        let registry = ModelRegistry::new();
        assert!(registry.get(ModelId::Claude4Sonnet).is_err());
    }

    #[test]
    fn test_list_allowed() {
        let registry = ModelRegistry::with_defaults();
        let models = ModelsConfig {
            allowed: vec![ModelId::Claude35Sonnet],
            default: ModelId::Claude35Sonnet,
        };
        let allowed = registry.list_allowed(&models);
        assert_eq!(allowed.len(), 1);
        assert_eq!(allowed[0].vendor, "Anthropic");
    }
}
