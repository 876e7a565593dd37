//! Answer generation from retrieved context

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::Chunk;

use super::prompt::PromptTemplate;

/// Turns (context, question) into answer text
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Answer `question` from `context`
    async fn answer(&self, context: &[Chunk], question: &str) -> Result<String>;
}

/// Answerer that stuffs all context into one prompt for a chat model
pub struct LlmAnswerer {
    llm: Arc<dyn LlmProvider>,
    template: PromptTemplate,
}

impl LlmAnswerer {
    /// Create an answerer
    pub fn new(llm: Arc<dyn LlmProvider>, template: PromptTemplate) -> Self {
        Self { llm, template }
    }

    /// Prompt template in use
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }
}

#[async_trait]
impl Answerer for LlmAnswerer {
    async fn answer(&self, context: &[Chunk], question: &str) -> Result<String> {
        let prompt = self
            .template
            .render(&PromptTemplate::build_context(context), question);

        tracing::debug!(
            "Prompting {} ({}) with {} context chunks",
            self.llm.name(),
            self.llm.model(),
            context.len()
        );

        let answer = self.llm.complete(&prompt).await?;
        Ok(answer.trim().to_string())
    }
}
