//! Answer types

use serde::{Deserialize, Serialize};

use super::document::Chunk;

/// Reference to a chunk handed to the model as context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRef {
    /// Path of the source file
    pub source: String,
    /// Page number (0-indexed)
    pub page: u32,
    /// Chunk index within the page
    pub chunk_index: u32,
}

impl From<&Chunk> for SourceRef {
    fn from(chunk: &Chunk) -> Self {
        Self {
            source: chunk.source.source.clone(),
            page: chunk.source.page,
            chunk_index: chunk.source.chunk_index,
        }
    }
}

/// Answer to one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Question as asked
    pub question: String,
    /// Question after company enrichment, as sent to retrieval and the model
    pub query: String,
    /// Model output
    pub text: String,
    /// Chunks the answer was grounded on, in retrieval order
    pub sources: Vec<SourceRef>,
    /// Wall-clock time spent answering
    pub response_time_ms: u64,
}
