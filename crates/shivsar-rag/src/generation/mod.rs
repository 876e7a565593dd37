//! Answer generation with a fixed company prompt

pub mod answerer;
pub mod prompt;

pub use answerer::{Answerer, LlmAnswerer};
pub use prompt::PromptTemplate;
