//! Drawing two models, collecting their answers and recording the vote.

pub mod completion;
pub mod instruction;
pub mod models;
pub mod response;

use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    arena::{
        completion::{CompletionError, ModelClient},
        instruction::instruction_for,
        models::{ModelRegistry, RegistryError, SupportedModel},
        response::{stream_responses, ResponseStream}
    },
    database::{BattleStore, StorageError},
    model::structures::{
        battle::{Battle, BattleDetails, BattleError, NewBattle, Winner},
        category::Category
    },
    rate_limit::{RateLimitError, RateLimiter}
};

const HEALTH_CHECK_INSTRUCTION: &str = "You are a kind person.";
const HEALTH_CHECK_PROMPT: &str = "Hello.";

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("translation needs both a source and a target language")]
    MissingLanguages,

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    InvalidBattle(#[from] BattleError),

    #[error(transparent)]
    Storage(#[from] StorageError)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub category: Category,
    pub source_language: Option<String>,
    pub target_language: Option<String>
}

impl GenerateRequest {
    pub fn summarize(prompt: impl Into<String>) -> GenerateRequest {
        GenerateRequest {
            prompt: prompt.into(),
            category: Category::Summarization,
            source_language: None,
            target_language: None
        }
    }

    pub fn translate(
        prompt: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>
    ) -> GenerateRequest {
        GenerateRequest {
            prompt: prompt.into(),
            category: Category::Translation,
            source_language: Some(source_language.into()),
            target_language: Some(target_language.into())
        }
    }

    fn languages(&self) -> Result<(&str, &str), ArenaError> {
        match (present(&self.source_language), present(&self.target_language)) {
            (Some(source), Some(target)) => Ok((source, target)),
            _ => Err(ArenaError::MissingLanguages)
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Which models answered a request, and how they were asked. Handed back
/// with the votes so the battle can be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleContext {
    pub category: Category,
    pub model_a: String,
    pub model_b: String,
    pub instruction_a: String,
    pub instruction_b: String,
    pub source_language: Option<String>,
    pub target_language: Option<String>
}

pub struct Arena {
    registry: ModelRegistry,
    client: Arc<dyn ModelClient>,
    limiter: Arc<RateLimiter>,
    battles: Arc<dyn BattleStore>,
    rng: Mutex<ChaCha8Rng>
}

impl Arena {
    pub fn new(
        registry: ModelRegistry,
        client: Arc<dyn ModelClient>,
        limiter: Arc<RateLimiter>,
        battles: Arc<dyn BattleStore>
    ) -> Arena {
        Arena {
            registry,
            client,
            limiter,
            battles,
            rng: Mutex::new(ChaCha8Rng::from_os_rng())
        }
    }

    /// Makes model draws reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(ChaCha8Rng::seed_from_u64(seed));
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Issues a session token that may immediately make a request.
    pub fn issue_token(&self) -> String {
        self.limiter.issue_token()
    }

    /// Answers `request` with two randomly drawn models.
    ///
    /// The token is charged before anything else, so a malformed request
    /// still counts against the cool-down.
    pub async fn generate(&self, token: &str, request: &GenerateRequest) -> Result<(BattleContext, ResponseStream), ArenaError> {
        self.limiter.check_rate_limit(token)?;

        let (source_language, target_language) = match request.category {
            Category::Summarization => (None, None),
            Category::Translation => {
                let (source, target) = request.languages()?;
                (Some(source.to_string()), Some(target.to_string()))
            }
        };

        let (model_a, model_b) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.registry.sample_pair(&mut *rng)?
        };

        let instruction = |model: &SupportedModel| {
            instruction_for(
                model,
                request.category,
                source_language.as_deref().unwrap_or_default(),
                target_language.as_deref().unwrap_or_default()
            )
        };
        let instruction_a = instruction(model_a);
        let instruction_b = instruction(model_b);

        let (response_a, response_b) = tokio::join!(
            self.client.complete(model_a, &instruction_a, &request.prompt),
            self.client.complete(model_b, &instruction_b, &request.prompt)
        );

        let (response_a, response_b) = match (response_a, response_b) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Completion failed for {} vs {}: {}", model_a.name, model_b.name, e);
                return Err(e.into());
            }
        };

        info!(
            "Generated {} battle between {} and {}",
            request.category, model_a.name, model_b.name
        );

        let context = BattleContext {
            category: request.category,
            model_a: model_a.name.clone(),
            model_b: model_b.name.clone(),
            instruction_a,
            instruction_b,
            source_language,
            target_language
        };

        let (stream, _) = stream_responses(response_a, response_b);
        Ok((context, stream))
    }

    /// Appends the outcome of one vote to the battle log.
    ///
    /// `response_languages` are the detected languages of the two answers;
    /// they are only kept for summarizations.
    pub async fn record_vote(
        &self,
        context: &BattleContext,
        winner: Winner,
        response_languages: (Option<&str>, Option<&str>)
    ) -> Result<NewBattle, ArenaError> {
        let battle = Battle::new(context.model_a.as_str(), context.model_b.as_str(), winner)?;

        let details = match context.category {
            Category::Summarization => BattleDetails::summarization(response_languages.0, response_languages.1),
            Category::Translation => match (&context.source_language, &context.target_language) {
                (Some(source), Some(target)) => BattleDetails::translation(source, target),
                _ => return Err(ArenaError::MissingLanguages)
            }
        };

        let new_battle = NewBattle { battle, details };
        self.battles.append(&new_battle).await?;

        info!(
            "Recorded {} vote: {} vs {} -> {}",
            context.category, context.model_a, context.model_b, winner
        );

        Ok(new_battle)
    }

    /// Sends a short greeting to every supported model and fails on the
    /// first one that does not answer.
    pub async fn check_models(&self) -> Result<(), ArenaError> {
        for model in self.registry.iter() {
            info!("Checking model {}...", model.name);
            self.client
                .complete(model, HEALTH_CHECK_INSTRUCTION, HEALTH_CHECK_PROMPT)
                .await?;
            info!("Model {} is available", model.name);
        }

        Ok(())
    }
}
