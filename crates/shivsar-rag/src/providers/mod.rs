//! Provider abstractions for embeddings and chat completion
//!
//! The pipeline only talks to these traits, so tests can swap in fakes for the
//! hosted OpenAI services.

pub mod embedding;
pub mod llm;
pub mod openai;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use openai::{OpenAiChat, OpenAiClient, OpenAiEmbedder, OpenAiProvider};
