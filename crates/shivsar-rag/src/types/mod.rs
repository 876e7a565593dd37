//! Core types for the RAG pipeline

pub mod document;
pub mod response;

pub use document::{Chunk, ChunkSource, PageDocument};
pub use response::{Answer, SourceRef};
