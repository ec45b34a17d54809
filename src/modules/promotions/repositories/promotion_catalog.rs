use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use crate::core::{AppError, Result};
use crate::modules::promotions::models::PromotionDefinition;

/// Source of promotion definitions, looked up by normalized code.
///
/// Lookups are synchronous so the resolver stays a plain function call.
pub trait PromotionCatalog: Send + Sync {
    fn find_by_code(&self, code: &str) -> Option<PromotionDefinition>;
}

/// Catalog held in memory, seeded from configuration
#[derive(Default)]
pub struct InMemoryPromotionCatalog {
    definitions: RwLock<HashMap<String, PromotionDefinition>>,
}

impl InMemoryPromotionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_definitions(definitions: Vec<PromotionDefinition>) -> Result<Self> {
        let catalog = Self::new();
        for definition in definitions {
            catalog.upsert(definition)?;
        }
        Ok(catalog)
    }

    /// Load definitions from a JSON file containing an array of definitions
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!(
                "Failed to read promotions file {}: {}",
                path.display(),
                e
            ))
        })?;
        let definitions: Vec<PromotionDefinition> = serde_json::from_str(&raw)?;

        tracing::info!(
            path = %path.display(),
            count = definitions.len(),
            "Loaded promotion definitions"
        );

        Self::with_definitions(definitions)
    }

    /// Insert or replace a definition
    pub fn upsert(&self, definition: PromotionDefinition) -> Result<()> {
        PromotionDefinition::validate_value(definition.discount_type, definition.discount_value)?;

        let key = PromotionDefinition::normalize_code(&definition.code);
        if key.is_empty() {
            return Err(AppError::validation("Promotion code cannot be empty"));
        }

        let mut definitions = self
            .definitions
            .write()
            .map_err(|_| AppError::internal("Promotion catalog lock poisoned"))?;
        definitions.insert(key, definition);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.definitions.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PromotionCatalog for InMemoryPromotionCatalog {
    fn find_by_code(&self, code: &str) -> Option<PromotionDefinition> {
        let key = PromotionDefinition::normalize_code(code);
        self.definitions.read().ok()?.get(&key).cloned()
    }
}
