//! AI interpreter implementations.

mod http;

use async_trait::async_trait;

use innerspell_core::domain::InterpretationPrompt;
use innerspell_core::ports::{InterpretError, Interpreter};

pub use http::{HttpInterpreter, HttpInterpreterConfig};

/// Stand-in used when no provider is configured; every call fails with `NotConfigured`.
pub struct UnconfiguredInterpreter;

#[async_trait]
impl Interpreter for UnconfiguredInterpreter {
    async fn interpret(&self, _prompt: &InterpretationPrompt) -> Result<String, InterpretError> {
        Err(InterpretError::NotConfigured)
    }
}
