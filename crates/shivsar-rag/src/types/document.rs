//! Page and chunk types with source tracking

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One page of source text, as produced by the loader
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageDocument {
    /// Extracted page text
    pub content: String,
    /// Path of the source file
    pub source: String,
    /// Page number (0-indexed)
    pub page: u32,
    /// SHA-256 of the whole source file
    pub content_hash: String,
}

impl PageDocument {
    /// Create a page document
    pub fn new(
        content: impl Into<String>,
        source: impl Into<String>,
        page: u32,
        content_hash: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            page,
            content_hash: content_hash.into(),
        }
    }
}

/// Where a chunk came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkSource {
    /// Path of the source file
    pub source: String,
    /// Page number (0-indexed)
    pub page: u32,
    /// Chunk index within the page
    pub chunk_index: u32,
    /// Character offset of the chunk within the page
    pub char_start: usize,
}

impl ChunkSource {
    /// Format source for display
    pub fn format_citation(&self) -> String {
        format!("{}, Page {}", self.source, self.page + 1)
    }
}

/// A bounded, overlapping slice of page text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Text content
    pub content: String,
    /// Source information
    pub source: ChunkSource,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(content: String, source: ChunkSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            source,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
