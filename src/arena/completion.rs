use async_trait::async_trait;
use thiserror::Error;

use crate::arena::models::SupportedModel;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("model '{0}' is not reachable")]
    Unavailable(String),

    #[error("model '{model}' failed: {reason}")]
    Failed { model: String, reason: String }
}

/// Access to the hosted models. Implementations talk to the provider
/// gateway; the arena only needs one chat turn per model.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends `instruction` as the system message and `prompt` as the user
    /// message, returning the model's reply.
    async fn complete(&self, model: &SupportedModel, instruction: &str, prompt: &str) -> Result<String, CompletionError>;
}
