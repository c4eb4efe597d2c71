use indexmap::IndexMap;
use rand::{seq::index, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid supported models document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("at least two models must be supported, got {0}")]
    NotEnoughModels(usize)
}

/// One entry of the supported models document. Keys are camelCase.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub summarize_instruction: Option<String>,
    pub translate_instruction: Option<String>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedModel {
    pub name: String,
    pub config: ModelConfig
}

impl SupportedModel {
    pub fn new(name: impl Into<String>, config: ModelConfig) -> SupportedModel {
        SupportedModel {
            name: name.into(),
            config
        }
    }

    /// The name a provider gateway routes on, `provider/name` when a
    /// provider is set.
    pub fn qualified_name(&self) -> String {
        match &self.config.provider {
            Some(provider) => format!("{}/{}", provider, self.name),
            None => self.name.clone()
        }
    }
}

/// Models that can be drawn into a battle, in document order.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<SupportedModel>
}

impl ModelRegistry {
    pub fn new(models: Vec<SupportedModel>) -> ModelRegistry {
        ModelRegistry { models }
    }

    /// Parses `{"<name>": {"provider": ..., "apiKey": ..., ...}}`. Every
    /// field of an entry is optional.
    pub fn from_json(document: &str) -> Result<ModelRegistry, RegistryError> {
        let entries: IndexMap<String, ModelConfig> = serde_json::from_str(document)?;

        Ok(ModelRegistry::new(
            entries
                .into_iter()
                .map(|(name, config)| SupportedModel::new(name, config))
                .collect()
        ))
    }

    pub fn get(&self, name: &str) -> Option<&SupportedModel> {
        self.models.iter().find(|model| model.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|model| model.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SupportedModel> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Draws two distinct models uniformly at random. The first one plays
    /// the model A side.
    pub fn sample_pair<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(&SupportedModel, &SupportedModel), RegistryError> {
        if self.models.len() < 2 {
            return Err(RegistryError::NotEnoughModels(self.models.len()));
        }

        let pair = index::sample(rng, self.models.len(), 2);
        Ok((&self.models[pair.index(0)], &self.models[pair.index(1)]))
    }
}
