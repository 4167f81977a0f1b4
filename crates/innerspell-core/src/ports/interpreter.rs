//! AI interpretation port - abstraction over LLM providers.

use async_trait::async_trait;

use crate::domain::InterpretationPrompt;

#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Produce an interpretation for the prompt.
    async fn interpret(&self, prompt: &InterpretationPrompt) -> Result<String, InterpretError>;
}

#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    #[error("No AI provider configured")]
    NotConfigured,

    #[error("Provider request failed: {0}")]
    Provider(String),

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}
