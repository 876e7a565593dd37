//! LLM provider trait for answer generation

use async_trait::async_trait;
use crate::error::Result;

/// Trait for chat-completion backends
///
/// Implementations:
/// - `OpenAiChat`: OpenAI chat completions (gpt-3.5-turbo)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a fully rendered prompt and return the model's reply
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get the model being used
    fn model(&self) -> &str;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
